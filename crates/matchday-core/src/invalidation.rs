//! Change signals returned by mutating operations.
//!
//! Every mutating repository call returns the list of records whose cached
//! state is now stale, in write order. Propagating them is the caller's job;
//! [`dispatch`] forwards them to an [`InvalidationSink`] one by one.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKey {
    /// The match row itself (status, outcome, metadata)
    Instances,
    /// The games belonging to a match
    Games,
    /// General events; the id is the event's own id
    Events,
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKey::Instances => write!(f, "instances"),
            CollectionKey::Games => write!(f, "games"),
            CollectionKey::Events => write!(f, "events"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Invalidation {
    pub collection: CollectionKey,
    pub id: Uuid,
}

impl Invalidation {
    pub fn instance(id: Uuid) -> Self {
        Self { collection: CollectionKey::Instances, id }
    }

    pub fn games(instance_id: Uuid) -> Self {
        Self { collection: CollectionKey::Games, id: instance_id }
    }

    pub fn event(id: Uuid) -> Self {
        Self { collection: CollectionKey::Events, id }
    }
}

pub trait InvalidationSink {
    fn invalidate(&self, signal: &Invalidation);
}

impl<F> InvalidationSink for F
where
    F: Fn(&Invalidation),
{
    fn invalidate(&self, signal: &Invalidation) {
        self(signal)
    }
}

/// Forwards each signal to `sink` in order.
pub fn dispatch<S>(signals: &[Invalidation], sink: &S)
where
    S: InvalidationSink + ?Sized,
{
    for signal in signals {
        sink.invalidate(signal);
    }
}
