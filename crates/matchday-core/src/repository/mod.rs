use crate::actor::Actor;
use crate::calendar::Calendar;
use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    Changed, DateRange, EventOutcome, GameUpdate, GeneralEvent, MatchGame, MatchInstance,
    MatchSeries, MatchStatus, NewEventData, NewScheduleData, ScheduleOutcome, ScheduleReport,
    SeriesRecord,
};
use crate::recurrence::MaterializationManager;
use async_trait::async_trait;
use uuid::Uuid;

// Re-export domain modules
pub mod calendar;
pub mod events;
pub mod games;
pub mod instances;
pub mod scheduling;

// Traits are defined in this module and implemented in respective domain modules.
// Every mutating method takes the acting user and checks privilege before it
// touches the database.

/// Domain-specific trait for turning schedule templates into persisted matches
#[async_trait]
pub trait SchedulingRepository {
    /// Creates a series plus its instances, or a single instance, then the
    /// requested placeholder games.
    async fn schedule_matches(&self, actor: &Actor, data: NewScheduleData) -> Result<ScheduleOutcome, CoreError>;
    async fn create_recurring(&self, actor: &Actor, data: NewScheduleData) -> Result<ScheduleOutcome, CoreError>;
    async fn create_single(&self, actor: &Actor, data: NewScheduleData) -> Result<ScheduleReport, CoreError>;
    async fn find_series_by_id(&self, id: Uuid) -> Result<Option<MatchSeries>, CoreError>;
    async fn find_series_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<MatchSeries>, CoreError>;
    async fn list_series(&self) -> Result<Vec<MatchSeries>, CoreError>;
    async fn find_orphan_series(&self) -> Result<Vec<MatchSeries>, CoreError>;
    async fn series_record(&self, series_id: Uuid) -> Result<SeriesRecord, CoreError>;
}

/// Domain-specific trait for match instances and their lifecycle
#[async_trait]
pub trait InstanceRepository {
    async fn find_instance_by_id(&self, id: Uuid) -> Result<Option<MatchInstance>, CoreError>;
    async fn find_instances_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<MatchInstance>, CoreError>;
    async fn list_instances(&self, range: DateRange) -> Result<Vec<MatchInstance>, CoreError>;
    async fn instances_for_series(&self, series_id: Uuid) -> Result<Vec<MatchInstance>, CoreError>;
    async fn transition_instance(
        &self,
        actor: &Actor,
        id: Uuid,
        target: MatchStatus,
        reason: Option<String>,
    ) -> Result<Changed<MatchInstance>, CoreError>;
    async fn delete_instance(&self, actor: &Actor, id: Uuid) -> Result<Changed<()>, CoreError>;
}

/// Domain-specific trait for the games played within a match
#[async_trait]
pub trait GameRepository {
    async fn replicate_games(
        &self,
        actor: &Actor,
        instance_ids: &[Uuid],
        count: Option<u32>,
    ) -> Result<Changed<Vec<MatchGame>>, CoreError>;
    async fn games_for_instance(&self, instance_id: Uuid) -> Result<Vec<MatchGame>, CoreError>;
    async fn find_game_by_id(&self, id: Uuid) -> Result<Option<MatchGame>, CoreError>;
    async fn find_games_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<MatchGame>, CoreError>;
    async fn add_game(&self, actor: &Actor, instance_id: Uuid) -> Result<Changed<MatchGame>, CoreError>;
    async fn remove_game(&self, actor: &Actor, game_id: Uuid) -> Result<Changed<()>, CoreError>;
    async fn record_game(&self, actor: &Actor, game_id: Uuid, update: GameUpdate) -> Result<Changed<MatchGame>, CoreError>;
}

/// Domain-specific trait for general (non-match) team events
#[async_trait]
pub trait EventRepository {
    async fn create_event(&self, actor: &Actor, data: NewEventData) -> Result<EventOutcome, CoreError>;
    async fn find_event_by_id(&self, id: Uuid) -> Result<Option<GeneralEvent>, CoreError>;
    async fn find_events_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<GeneralEvent>, CoreError>;
    async fn list_events(&self, range: DateRange) -> Result<Vec<GeneralEvent>, CoreError>;
    async fn delete_event(&self, actor: &Actor, id: Uuid) -> Result<Changed<()>, CoreError>;
}

/// Domain-specific trait for the merged calendar view
#[async_trait]
pub trait CalendarRepository {
    async fn calendar_between(&self, range: DateRange) -> Result<Calendar, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository:
    SchedulingRepository +
    InstanceRepository +
    GameRepository +
    EventRepository +
    CalendarRepository
{
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    materialization_manager: MaterializationManager,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, materialization_manager: MaterializationManager) -> Self {
        Self { pool, materialization_manager }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub(crate) fn materialization_manager(&self) -> &MaterializationManager {
        &self.materialization_manager
    }
}

impl Repository for SqliteRepository {}

/// SQLite's default cap on bound parameters in one statement.
pub(crate) const SQLITE_MAX_BINDS: usize = 999;

/// Rows per multi-row `INSERT` so a chunk stays under [`SQLITE_MAX_BINDS`].
pub(crate) fn rows_per_insert(columns: usize) -> usize {
    (SQLITE_MAX_BINDS / columns).max(1)
}

/// `LIKE` pattern matching ids whose hex form starts with `short_id`.
///
/// Ids are stored as 16-byte blobs, so the prefix is compared against
/// `lower(hex(id))` with any dashes removed. Returns `None` for input that
/// cannot prefix an id at all.
pub(crate) fn short_id_pattern(short_id: &str) -> Option<String> {
    let hex: String = short_id.chars().filter(|c| *c != '-').collect();
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let mut pattern = hex.to_ascii_lowercase();
    pattern.push('%');
    Some(pattern)
}
