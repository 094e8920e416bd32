use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::invalidation::Invalidation;
use crate::recurrence::WeekdaySet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::InProgress => write!(f, "in progress"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid match status: {0}")]
pub struct ParseMatchStatusError(String);

impl FromStr for MatchStatus {
    type Err = ParseMatchStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "in_progress" | "live" => Ok(MatchStatus::InProgress),
            "completed" | "done" => Ok(MatchStatus::Completed),
            "cancelled" | "canceled" => Ok(MatchStatus::Cancelled),
            _ => Err(ParseMatchStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
    NotApplicable,
}

impl Default for GameResult {
    fn default() -> Self {
        GameResult::NotApplicable
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Win => write!(f, "win"),
            GameResult::Loss => write!(f, "loss"),
            GameResult::Draw => write!(f, "draw"),
            GameResult::NotApplicable => write!(f, "n/a"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid game result: {0}")]
pub struct ParseGameResultError(String);

impl FromStr for GameResult {
    type Err = ParseGameResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "win" | "w" => Ok(GameResult::Win),
            "loss" | "l" => Ok(GameResult::Loss),
            "draw" | "d" => Ok(GameResult::Draw),
            "n/a" | "na" | "none" | "not_applicable" => Ok(GameResult::NotApplicable),
            _ => Err(ParseGameResultError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Practice,
    Meeting,
    Tournament,
    Review,
    Social,
    Other,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::Practice => write!(f, "practice"),
            EventCategory::Meeting => write!(f, "meeting"),
            EventCategory::Tournament => write!(f, "tournament"),
            EventCategory::Review => write!(f, "review"),
            EventCategory::Social => write!(f, "social"),
            EventCategory::Other => write!(f, "other"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid event category: {0}")]
pub struct ParseEventCategoryError(String);

impl FromStr for EventCategory {
    type Err = ParseEventCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "practice" | "scrim" => Ok(EventCategory::Practice),
            "meeting" => Ok(EventCategory::Meeting),
            "tournament" => Ok(EventCategory::Tournament),
            "review" | "vod" => Ok(EventCategory::Review),
            "social" => Ok(EventCategory::Social),
            "other" => Ok(EventCategory::Other),
            _ => Err(ParseEventCategoryError(s.to_string())),
        }
    }
}

// ============================================================================
// Persisted Records
// ============================================================================

/// A weekly recurrence template. Series are written once and never edited;
/// their instances carry the per-occurrence state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchSeries {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Display label shared by every generated match (usually the opponent)
    pub opponent: String,
    pub weekdays: WeekdaySet,
    /// Anchor date; only generates a match if its weekday is in `weekdays`
    pub start_date: NaiveDate,
    /// Inclusive last date
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub patch: Option<String>,
    /// Canonical RFC 5545 form of the recurrence, kept for export
    pub rrule: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One schedulable match.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchInstance {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Null for one-off matches
    pub series_id: Option<Uuid>,
    pub opponent: String,
    pub match_date: NaiveDate,
    pub match_time: Option<NaiveTime>,
    pub status: MatchStatus,
    /// `"{w}W-{l}L-{d}D"`, present only while completed
    pub outcome: Option<String>,
    pub cancel_reason: Option<String>,
    pub notes: Option<String>,
    pub patch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchInstance {
    /// Builds the instance for one occurrence of `series`.
    pub fn from_series(series: &MatchSeries, match_date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id: series.owner_id,
            series_id: Some(series.id),
            opponent: series.opponent.clone(),
            match_date,
            match_time: series.start_time,
            status: MatchStatus::Scheduled,
            outcome: None,
            cancel_reason: None,
            notes: series.notes.clone(),
            patch: series.patch.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single game played within a match. Ordinals run 1..N per match.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchGame {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub ordinal: i64,
    pub result: GameResult,
    pub duration: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchGame {
    pub fn placeholder(instance_id: Uuid, ordinal: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            instance_id,
            ordinal,
            result: GameResult::NotApplicable,
            duration: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A team event that is not a match (practice, review, meeting...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneralEvent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub category: EventCategory,
    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Data Transfer Objects (DTOs)
// ============================================================================

/// "Repeat weekly on {weekdays} until {until}".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatRule {
    pub weekdays: WeekdaySet,
    pub until: NaiveDate,
}

/// Validated schedule form input. With `recurrence` set, a series is created
/// and `date` is its anchor; otherwise a single match on `date` is created.
#[derive(Debug, Clone)]
pub struct NewScheduleData {
    pub opponent: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub recurrence: Option<RepeatRule>,
    /// Placeholder games to create per match
    pub game_count: Option<u32>,
    pub notes: Option<String>,
    pub patch: Option<String>,
}

impl Default for NewScheduleData {
    fn default() -> Self {
        Self {
            opponent: String::new(),
            date: Utc::now().date_naive(),
            time: None,
            recurrence: None,
            game_count: None,
            notes: None,
            patch: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameUpdate {
    pub result: Option<GameResult>,
    pub duration: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct NewEventData {
    pub title: String,
    pub category: EventCategory,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
    /// Each occurrence becomes an independent event row
    pub recurrence: Option<RepeatRule>,
}

/// Inclusive date bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

// ============================================================================
// Operation Results
// ============================================================================

/// A mutation result together with the change signals the caller must
/// propagate, one per affected record, in the order they were written.
#[derive(Debug, Clone)]
pub struct Changed<T> {
    pub value: T,
    pub invalidations: Vec<Invalidation>,
}

impl<T> Changed<T> {
    pub fn new(value: T, invalidations: Vec<Invalidation>) -> Self {
        Self { value, invalidations }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    /// Present for recurring schedules
    pub series: Option<MatchSeries>,
    pub instances: Vec<MatchInstance>,
    pub games: Vec<MatchGame>,
    pub invalidations: Vec<Invalidation>,
}

#[derive(Debug, Clone)]
pub enum ScheduleOutcome {
    Scheduled(ScheduleReport),
    /// The recurrence produced no dates; nothing was written.
    NoOccurrences,
}

#[derive(Debug, Clone)]
pub enum EventOutcome {
    Created(Changed<Vec<GeneralEvent>>),
    /// The recurrence produced no dates; nothing was written.
    NoOccurrences,
}

/// Aggregate record for all matches of one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesRecord {
    pub series_id: Uuid,
    pub total_matches: u32,
    pub scheduled: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub cancelled: u32,
    /// Game totals across completed matches only
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl SeriesRecord {
    /// Share of decided games won, or `None` before any game is decided.
    pub fn win_rate(&self) -> Option<f64> {
        let decided = self.wins + self.losses + self.draws;
        if decided == 0 {
            None
        } else {
            Some(self.wins as f64 / decided as f64)
        }
    }
}

/// Configuration for materialization behavior
#[derive(Debug, Clone)]
pub struct MaterializationConfig {
    /// Upper bound on matches one series may generate
    pub max_occurrences: usize,
    /// Upper bound on placeholder games per match
    pub max_games_per_match: u32,
}

impl Default for MaterializationConfig {
    fn default() -> Self {
        Self {
            max_occurrences: 366,
            max_games_per_match: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_status_from_str() {
        assert_eq!("in-progress".parse::<MatchStatus>(), Ok(MatchStatus::InProgress));
        assert_eq!("In Progress".parse::<MatchStatus>(), Ok(MatchStatus::InProgress));
        assert_eq!("canceled".parse::<MatchStatus>(), Ok(MatchStatus::Cancelled));
        assert!("paused".parse::<MatchStatus>().is_err());
    }

    #[test]
    fn test_game_result_defaults_to_not_applicable() {
        assert_eq!(GameResult::default(), GameResult::NotApplicable);
        assert_eq!("W".parse::<GameResult>(), Ok(GameResult::Win));
        assert_eq!("n/a".parse::<GameResult>(), Ok(GameResult::NotApplicable));
    }

    #[test]
    fn test_match_status_serializes_snake_case() {
        let json = serde_json::to_string(&MatchStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_win_rate() {
        let mut record = SeriesRecord {
            series_id: Uuid::now_v7(),
            total_matches: 2,
            scheduled: 0,
            in_progress: 0,
            completed: 2,
            cancelled: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        };
        assert_eq!(record.win_rate(), None);

        record.wins = 3;
        record.losses = 1;
        assert_eq!(record.win_rate(), Some(0.75));
    }
}
