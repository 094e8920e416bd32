//! Read-side calendar combining matches and general events.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

use crate::models::{EventCategory, GeneralEvent, MatchInstance, MatchStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySource {
    Match { instance_id: Uuid, status: MatchStatus },
    Event { event_id: Uuid, category: EventCategory },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub title: String,
    pub source: EntrySource,
}

impl From<&MatchInstance> for CalendarEntry {
    fn from(instance: &MatchInstance) -> Self {
        Self {
            date: instance.match_date,
            time: instance.match_time,
            title: format!("vs {}", instance.opponent),
            source: EntrySource::Match {
                instance_id: instance.id,
                status: instance.status,
            },
        }
    }
}

impl From<&GeneralEvent> for CalendarEntry {
    fn from(event: &GeneralEvent) -> Self {
        Self {
            date: event.event_date,
            time: event.start_time,
            title: event.title.clone(),
            source: EntrySource::Event {
                event_id: event.id,
                category: event.category,
            },
        }
    }
}

/// Ordering used by the calendar: date, then timed entries before untimed
/// ones (times compared when both have one), then title.
pub fn calendar_order(a: &CalendarEntry, b: &CalendarEntry) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| match (a.time, b.time) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.title.cmp(&b.title))
}

/// Sorted calendar entries. Entries from different sources are never
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Calendar {
    entries: Vec<CalendarEntry>,
}

impl Calendar {
    pub fn merge<I, C>(collections: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = CalendarEntry>,
    {
        let mut entries: Vec<CalendarEntry> = collections.into_iter().flatten().collect();
        entries.sort_by(calendar_order);
        Self { entries }
    }

    pub fn entries(&self) -> &[CalendarEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose calendar day equals `date`.
    pub fn events_on(&self, date: NaiveDate) -> &[CalendarEntry] {
        let start = self.entries.partition_point(|e| e.date < date);
        let end = self.entries.partition_point(|e| e.date <= date);
        &self.entries[start..end]
    }

    /// Entries grouped by day, in date order.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[CalendarEntry])> {
        self.entries
            .chunk_by(|a, b| a.date == b.date)
            .map(|day| (day[0].date, day))
    }
}

impl IntoIterator for Calendar {
    type Item = CalendarEntry;
    type IntoIter = std::vec::IntoIter<CalendarEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
