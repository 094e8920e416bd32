use crate::actor::Actor;
use crate::error::{CoreError, CreatedEntities, FailedStage};
use crate::invalidation::Invalidation;
use crate::models::{
    MatchInstance, MatchSeries, MatchStatus, NewScheduleData, ScheduleOutcome, ScheduleReport,
    SeriesRecord,
};
use crate::recurrence::WeeklyRecurrence;
use crate::repository::{
    rows_per_insert, short_id_pattern, GameRepository, SchedulingRepository, SqliteRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

const INSTANCE_COLUMNS: usize = 13;

#[async_trait]
impl SchedulingRepository for SqliteRepository {
    #[tracing::instrument(skip(self, actor, data), fields(user = %actor.user_id, opponent = %data.opponent))]
    async fn schedule_matches(&self, actor: &Actor, data: NewScheduleData) -> Result<ScheduleOutcome, CoreError> {
        actor.authorize("schedule matches")?;

        let game_count = data.game_count.unwrap_or(0);
        self.materialization_manager().check_game_count(game_count)?;

        let mut report = if data.recurrence.is_some() {
            match self.create_recurring(actor, data).await? {
                ScheduleOutcome::Scheduled(report) => report,
                ScheduleOutcome::NoOccurrences => return Ok(ScheduleOutcome::NoOccurrences),
            }
        } else {
            self.create_single(actor, data).await?
        };

        if game_count == 0 {
            return Ok(ScheduleOutcome::Scheduled(report));
        }

        let instance_ids: Vec<Uuid> = report.instances.iter().map(|i| i.id).collect();
        match self.replicate_games(actor, &instance_ids, Some(game_count)).await {
            Ok(games) => {
                report.games = games.value;
                report.invalidations.extend(games.invalidations);
                Ok(ScheduleOutcome::Scheduled(report))
            }
            Err(source) => {
                let created = CreatedEntities {
                    series_id: report.series.as_ref().map(|s| s.id),
                    instance_ids,
                };
                warn!(error = %source, %created, "matches were scheduled but their games were not");
                Err(CoreError::PartialFailure {
                    stage: FailedStage::Games,
                    created,
                    source: Box::new(source),
                })
            }
        }
    }

    #[tracing::instrument(skip(self, actor, data), fields(user = %actor.user_id))]
    async fn create_recurring(&self, actor: &Actor, data: NewScheduleData) -> Result<ScheduleOutcome, CoreError> {
        actor.authorize("schedule matches")?;
        validate_template(&data)?;

        let rule = data.recurrence.ok_or_else(|| {
            CoreError::InvalidInput("A recurring schedule needs weekdays and an end date".to_string())
        })?;

        // Expansion runs before any write, so an empty result persists nothing.
        let dates = self.materialization_manager().plan_occurrences(data.date, Some(&rule))?;
        if dates.is_empty() {
            info!(anchor = %data.date, weekdays = %rule.weekdays, until = %rule.until, "recurrence has no occurrences, nothing scheduled");
            return Ok(ScheduleOutcome::NoOccurrences);
        }

        let now = Utc::now();
        let series = MatchSeries {
            id: Uuid::now_v7(),
            owner_id: actor.user_id,
            opponent: data.opponent,
            weekdays: rule.weekdays,
            start_date: data.date,
            end_date: rule.until,
            start_time: data.time,
            notes: data.notes,
            patch: data.patch,
            rrule: WeeklyRecurrence::new(data.date, rule).to_rrule()?,
            created_at: now,
            updated_at: now,
        };

        let instances: Vec<MatchInstance> = dates
            .into_iter()
            .map(|date| MatchInstance::from_series(&series, date, now))
            .collect();

        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"INSERT INTO match_series (id, owner_id, opponent, weekdays, start_date, end_date, start_time, notes, patch, rrule, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(series.id)
        .bind(series.owner_id)
        .bind(&series.opponent)
        .bind(series.weekdays)
        .bind(series.start_date)
        .bind(series.end_date)
        .bind(series.start_time)
        .bind(&series.notes)
        .bind(&series.patch)
        .bind(&series.rrule)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_instances(&mut tx, &instances).await?;

        tx.commit().await?;

        info!(series_id = %series.id, matches = instances.len(), rrule = %series.rrule, "created match series");

        let invalidations = instances.iter().map(|i| Invalidation::instance(i.id)).collect();
        Ok(ScheduleOutcome::Scheduled(ScheduleReport {
            series: Some(series),
            instances,
            games: Vec::new(),
            invalidations,
        }))
    }

    #[tracing::instrument(skip(self, actor, data), fields(user = %actor.user_id))]
    async fn create_single(&self, actor: &Actor, data: NewScheduleData) -> Result<ScheduleReport, CoreError> {
        actor.authorize("schedule matches")?;
        validate_template(&data)?;

        let now = Utc::now();
        let instance = MatchInstance {
            id: Uuid::now_v7(),
            owner_id: actor.user_id,
            series_id: None,
            opponent: data.opponent,
            match_date: data.date,
            match_time: data.time,
            status: MatchStatus::Scheduled,
            outcome: None,
            cancel_reason: None,
            notes: data.notes,
            patch: data.patch,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool().begin().await?;
        Self::insert_instances(&mut tx, std::slice::from_ref(&instance)).await?;
        tx.commit().await?;

        info!(instance_id = %instance.id, date = %instance.match_date, "scheduled single match");

        Ok(ScheduleReport {
            series: None,
            invalidations: vec![Invalidation::instance(instance.id)],
            instances: vec![instance],
            games: Vec::new(),
        })
    }

    async fn find_series_by_id(&self, id: Uuid) -> Result<Option<MatchSeries>, CoreError> {
        let series = sqlx::query_as("SELECT * FROM match_series WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(series)
    }

    async fn find_series_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<MatchSeries>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };
        let series = sqlx::query_as("SELECT * FROM match_series WHERE lower(hex(id)) LIKE $1")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(series)
    }

    async fn list_series(&self) -> Result<Vec<MatchSeries>, CoreError> {
        let series = sqlx::query_as("SELECT * FROM match_series ORDER BY start_date, opponent")
            .fetch_all(self.pool())
            .await?;
        Ok(series)
    }

    async fn find_orphan_series(&self) -> Result<Vec<MatchSeries>, CoreError> {
        let series = sqlx::query_as(
            r#"SELECT s.* FROM match_series s
            WHERE NOT EXISTS (SELECT 1 FROM match_instances i WHERE i.series_id = s.id)
            ORDER BY s.start_date"#,
        )
        .fetch_all(self.pool())
        .await?;
        Ok(series)
    }

    async fn series_record(&self, series_id: Uuid) -> Result<SeriesRecord, CoreError> {
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM match_series WHERE id = $1")
            .bind(series_id)
            .fetch_optional(self.pool())
            .await?;
        if exists.is_none() {
            return Err(CoreError::NotFound(format!("Series with id {} not found", series_id)));
        }

        let status_counts: (i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"SELECT
                COUNT(*) as total,
                COUNT(CASE WHEN status = 'scheduled' THEN 1 END) as scheduled,
                COUNT(CASE WHEN status = 'in_progress' THEN 1 END) as in_progress,
                COUNT(CASE WHEN status = 'completed' THEN 1 END) as completed,
                COUNT(CASE WHEN status = 'cancelled' THEN 1 END) as cancelled
            FROM match_instances WHERE series_id = $1"#,
        )
        .bind(series_id)
        .fetch_one(self.pool())
        .await?;

        let game_counts: (i64, i64, i64) = sqlx::query_as(
            r#"SELECT
                COUNT(CASE WHEN g.result = 'win' THEN 1 END) as wins,
                COUNT(CASE WHEN g.result = 'loss' THEN 1 END) as losses,
                COUNT(CASE WHEN g.result = 'draw' THEN 1 END) as draws
            FROM match_games g
            JOIN match_instances i ON i.id = g.instance_id
            WHERE i.series_id = $1 AND i.status = 'completed'"#,
        )
        .bind(series_id)
        .fetch_one(self.pool())
        .await?;

        Ok(SeriesRecord {
            series_id,
            total_matches: status_counts.0 as u32,
            scheduled: status_counts.1 as u32,
            in_progress: status_counts.2 as u32,
            completed: status_counts.3 as u32,
            cancelled: status_counts.4 as u32,
            wins: game_counts.0 as u32,
            losses: game_counts.1 as u32,
            draws: game_counts.2 as u32,
        })
    }
}

impl SqliteRepository {
    /// Bulk insert within an existing transaction, chunked to stay under the
    /// bind-parameter limit.
    pub(crate) async fn insert_instances(
        tx: &mut Transaction<'_, Sqlite>,
        instances: &[MatchInstance],
    ) -> Result<(), CoreError> {
        for chunk in instances.chunks(rows_per_insert(INSTANCE_COLUMNS)) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO match_instances (id, owner_id, series_id, opponent, match_date, match_time, status, outcome, cancel_reason, notes, patch, created_at, updated_at) ",
            );
            qb.push_values(chunk, |mut row, instance| {
                row.push_bind(instance.id)
                    .push_bind(instance.owner_id)
                    .push_bind(instance.series_id)
                    .push_bind(instance.opponent.clone())
                    .push_bind(instance.match_date)
                    .push_bind(instance.match_time)
                    .push_bind(instance.status)
                    .push_bind(instance.outcome.clone())
                    .push_bind(instance.cancel_reason.clone())
                    .push_bind(instance.notes.clone())
                    .push_bind(instance.patch.clone())
                    .push_bind(instance.created_at)
                    .push_bind(instance.updated_at);
            });
            qb.build().execute(&mut **tx).await?;
        }
        Ok(())
    }
}

fn validate_template(data: &NewScheduleData) -> Result<(), CoreError> {
    if data.opponent.trim().is_empty() {
        return Err(CoreError::InvalidInput("Opponent cannot be empty".to_string()));
    }
    Ok(())
}
