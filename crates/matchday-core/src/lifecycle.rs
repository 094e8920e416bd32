//! Match status state machine and outcome aggregation.
//!
//! Everything here is pure; the repository loads the current status and games,
//! asks this module what a transition implies, and persists the answer.
//!
//! | From                  | To                     | Outcome   |
//! |-----------------------|------------------------|-----------|
//! | Scheduled/InProgress  | Completed              | recompute |
//! | Completed             | Scheduled/InProgress   | clear     |
//! | Scheduled/InProgress/Completed | Cancelled     | clear     |
//! | Cancelled             | Scheduled              | keep      |
//! | Scheduled             | InProgress (and back)  | keep      |

use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{GameResult, MatchStatus};

/// What a transition does to the stored outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeEffect {
    /// Recompute from the current games
    Recompute,
    /// Set to absent
    Clear,
    /// Leave as stored
    Keep,
}

pub fn plan_transition(from: MatchStatus, to: MatchStatus) -> Result<OutcomeEffect, CoreError> {
    use MatchStatus::*;

    match (from, to) {
        (Scheduled, InProgress) | (InProgress, Scheduled) => Ok(OutcomeEffect::Keep),
        (Scheduled | InProgress, Completed) => Ok(OutcomeEffect::Recompute),
        (Completed, Scheduled | InProgress) => Ok(OutcomeEffect::Clear),
        (Scheduled | InProgress | Completed, Cancelled) => Ok(OutcomeEffect::Clear),
        (Cancelled, Scheduled) => Ok(OutcomeEffect::Keep),
        _ => Err(CoreError::InvalidTransition { from, to }),
    }
}

/// Win/loss/draw counts over a set of games. Games without a result are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Tally {
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = GameResult>,
    {
        results.into_iter().fold(Tally::default(), |mut tally, result| {
            match result {
                GameResult::Win => tally.wins += 1,
                GameResult::Loss => tally.losses += 1,
                GameResult::Draw => tally.draws += 1,
                GameResult::NotApplicable => {}
            }
            tally
        })
    }

    /// `"{w}W-{l}L-{d}D"`
    pub fn summary(&self) -> String {
        format!("{}W-{}L-{}D", self.wins, self.losses, self.draws)
    }
}

/// Outcome string for a completed match with the given game results.
pub fn aggregate_outcome<I>(results: I) -> String
where
    I: IntoIterator<Item = GameResult>,
{
    Tally::from_results(results).summary()
}

/// Games may only be added or removed while the match is still open.
pub fn ensure_structurally_editable(id: Uuid, status: MatchStatus) -> Result<(), CoreError> {
    match status {
        MatchStatus::Scheduled | MatchStatus::InProgress => Ok(()),
        MatchStatus::Completed | MatchStatus::Cancelled => {
            Err(CoreError::InstanceLocked { id, status })
        }
    }
}

/// Game results can be corrected on any match that has not been cancelled.
pub fn ensure_results_editable(id: Uuid, status: MatchStatus) -> Result<(), CoreError> {
    if status == MatchStatus::Cancelled {
        Err(CoreError::InstanceLocked { id, status })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use MatchStatus::*;

    mod transition_tests {
        use super::*;

        #[rstest]
        #[case(Scheduled, Completed, OutcomeEffect::Recompute)]
        #[case(InProgress, Completed, OutcomeEffect::Recompute)]
        #[case(Completed, Scheduled, OutcomeEffect::Clear)]
        #[case(Completed, InProgress, OutcomeEffect::Clear)]
        #[case(Scheduled, Cancelled, OutcomeEffect::Clear)]
        #[case(InProgress, Cancelled, OutcomeEffect::Clear)]
        #[case(Completed, Cancelled, OutcomeEffect::Clear)]
        #[case(Cancelled, Scheduled, OutcomeEffect::Keep)]
        #[case(Scheduled, InProgress, OutcomeEffect::Keep)]
        #[case(InProgress, Scheduled, OutcomeEffect::Keep)]
        fn test_allowed(#[case] from: MatchStatus, #[case] to: MatchStatus, #[case] effect: OutcomeEffect) {
            assert_eq!(plan_transition(from, to).unwrap(), effect);
        }

        #[rstest]
        #[case(Cancelled, InProgress)]
        #[case(Cancelled, Completed)]
        #[case(Cancelled, Cancelled)]
        #[case(Completed, Completed)]
        #[case(Scheduled, Scheduled)]
        fn test_rejected(#[case] from: MatchStatus, #[case] to: MatchStatus) {
            let err = plan_transition(from, to).unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition { from: f, to: t } if f == from && t == to));
        }
    }

    mod aggregate_tests {
        use super::*;

        #[test]
        fn test_not_applicable_is_ignored() {
            let results = [GameResult::Win, GameResult::Win, GameResult::Loss, GameResult::NotApplicable];
            assert_eq!(aggregate_outcome(results), "2W-1L-0D");
        }

        #[test]
        fn test_no_games() {
            assert_eq!(aggregate_outcome(Vec::new()), "0W-0L-0D");
        }

        #[test]
        fn test_draws_counted() {
            let results = [GameResult::Draw, GameResult::Loss, GameResult::Draw];
            let tally = Tally::from_results(results);
            assert_eq!(tally, Tally { wins: 0, losses: 1, draws: 2 });
            assert_eq!(tally.summary(), "0W-1L-2D");
        }
    }

    mod guard_tests {
        use super::*;

        #[rstest]
        #[case(Scheduled, true)]
        #[case(InProgress, true)]
        #[case(Completed, false)]
        #[case(Cancelled, false)]
        fn test_structural_edits(#[case] status: MatchStatus, #[case] allowed: bool) {
            assert_eq!(ensure_structurally_editable(Uuid::now_v7(), status).is_ok(), allowed);
        }

        #[test]
        fn test_results_locked_only_when_cancelled() {
            let id = Uuid::now_v7();
            assert!(ensure_results_editable(id, Completed).is_ok());
            assert!(matches!(
                ensure_results_editable(id, Cancelled),
                Err(CoreError::InstanceLocked { status: Cancelled, .. })
            ));
        }
    }
}
