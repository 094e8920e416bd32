use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::models::MatchStatus;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not authorized to {action}")]
    Unauthorized { action: &'static str },

    /// A multi-step creation stopped after its primary records were committed.
    /// `created` lists what now exists so the caller can repair or retry only
    /// the failed stage.
    #[error("{stage} could not be created; {created} already exist")]
    PartialFailure {
        stage: FailedStage,
        created: CreatedEntities,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot move a match from {from} to {to}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },

    #[error("Match {id} is {status}; games can only change while it is scheduled or in progress")]
    InstanceLocked { id: Uuid, status: MatchStatus },

    #[error("Ambiguous short ID. Did you mean one of these?")]
    AmbiguousId(Vec<(String, String)>), // Vec of (ID, label)
}

/// Coarse classification used by callers that only need to branch on the
/// kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    Persistence,
    PartialFailure,
    NotFound,
    InvalidInput,
    InvalidTransition,
    Locked,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Database(_) | CoreError::Migration(_) | CoreError::Io(_) => {
                ErrorKind::Persistence
            }
            CoreError::Unauthorized { .. } => ErrorKind::Authorization,
            CoreError::PartialFailure { .. } => ErrorKind::PartialFailure,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::InvalidInput(_) | CoreError::AmbiguousId(_) => ErrorKind::InvalidInput,
            CoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            CoreError::InstanceLocked { .. } => ErrorKind::Locked,
        }
    }
}

/// The step of a multi-step creation that failed. Series and their instances
/// share one transaction, so only the follow-up game step can fail on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Games,
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedStage::Games => write!(f, "games"),
        }
    }
}

/// Identifiers of records that were persisted before a later step failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedEntities {
    pub series_id: Option<Uuid>,
    pub instance_ids: Vec<Uuid>,
}

impl fmt::Display for CreatedEntities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.series_id {
            Some(series_id) => write!(
                f,
                "series {} and {} match(es)",
                series_id,
                self.instance_ids.len()
            ),
            None => write!(f, "{} match(es)", self.instance_ids.len()),
        }
    }
}
