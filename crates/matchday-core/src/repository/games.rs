use crate::actor::Actor;
use crate::error::CoreError;
use crate::invalidation::Invalidation;
use crate::lifecycle::{aggregate_outcome, ensure_results_editable, ensure_structurally_editable};
use crate::models::{Changed, GameResult, GameUpdate, MatchGame, MatchStatus};
use crate::repository::{rows_per_insert, short_id_pattern, GameRepository, SqliteRepository};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

const GAME_COLUMNS: usize = 8;

#[async_trait]
impl GameRepository for SqliteRepository {
    /// Creates `count` placeholder games for every listed match in one
    /// transaction. Matches must exist, be open and have no games yet.
    #[tracing::instrument(skip(self, actor, instance_ids), fields(user = %actor.user_id, matches = instance_ids.len()))]
    async fn replicate_games(
        &self,
        actor: &Actor,
        instance_ids: &[Uuid],
        count: Option<u32>,
    ) -> Result<Changed<Vec<MatchGame>>, CoreError> {
        actor.authorize("add games")?;

        let count = match count {
            Some(count) if count > 0 && !instance_ids.is_empty() => count,
            _ => return Ok(Changed::new(Vec::new(), Vec::new())),
        };
        self.materialization_manager().check_game_count(count)?;

        let mut seen = HashSet::new();
        let instance_ids: Vec<Uuid> = instance_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut tx = self.pool().begin().await?;

        for &instance_id in &instance_ids {
            let status = Self::instance_status(&mut tx, instance_id).await?;
            ensure_structurally_editable(instance_id, status)?;

            let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM match_games WHERE instance_id = $1")
                .bind(instance_id)
                .fetch_one(&mut *tx)
                .await?;
            if existing > 0 {
                return Err(CoreError::InvalidInput(format!(
                    "Match {} already has {} game(s); add games individually instead",
                    instance_id, existing
                )));
            }
        }

        let now = Utc::now();
        let games: Vec<MatchGame> = instance_ids
            .iter()
            .flat_map(|&instance_id| {
                (1..=i64::from(count)).map(move |ordinal| MatchGame::placeholder(instance_id, ordinal, now))
            })
            .collect();

        Self::insert_games(&mut tx, &games).await?;
        tx.commit().await?;

        info!(games = games.len(), per_match = count, "replicated placeholder games");

        let invalidations = instance_ids.iter().map(|&id| Invalidation::games(id)).collect();
        Ok(Changed::new(games, invalidations))
    }

    async fn games_for_instance(&self, instance_id: Uuid) -> Result<Vec<MatchGame>, CoreError> {
        let games = sqlx::query_as("SELECT * FROM match_games WHERE instance_id = $1 ORDER BY ordinal")
            .bind(instance_id)
            .fetch_all(self.pool())
            .await?;
        Ok(games)
    }

    async fn find_game_by_id(&self, id: Uuid) -> Result<Option<MatchGame>, CoreError> {
        let game = sqlx::query_as("SELECT * FROM match_games WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(game)
    }

    async fn find_games_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<MatchGame>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };
        let games = sqlx::query_as("SELECT * FROM match_games WHERE lower(hex(id)) LIKE $1")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(games)
    }

    #[tracing::instrument(skip(self, actor), fields(user = %actor.user_id))]
    async fn add_game(&self, actor: &Actor, instance_id: Uuid) -> Result<Changed<MatchGame>, CoreError> {
        actor.authorize("add games")?;

        let mut tx = self.pool().begin().await?;

        let status = Self::instance_status(&mut tx, instance_id).await?;
        ensure_structurally_editable(instance_id, status)?;

        let last: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(ordinal), 0) FROM match_games WHERE instance_id = $1")
            .bind(instance_id)
            .fetch_one(&mut *tx)
            .await?;

        let game = MatchGame::placeholder(instance_id, last + 1, Utc::now());
        Self::insert_games(&mut tx, std::slice::from_ref(&game)).await?;
        tx.commit().await?;

        info!(%instance_id, ordinal = game.ordinal, "added game");
        Ok(Changed::new(game, vec![Invalidation::games(instance_id)]))
    }

    /// Deletes a game and shifts the later ordinals down so they stay 1..N.
    #[tracing::instrument(skip(self, actor), fields(user = %actor.user_id))]
    async fn remove_game(&self, actor: &Actor, game_id: Uuid) -> Result<Changed<()>, CoreError> {
        actor.authorize("remove games")?;

        let mut tx = self.pool().begin().await?;

        let game: MatchGame = sqlx::query_as("SELECT * FROM match_games WHERE id = $1")
            .bind(game_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Game with id {} not found", game_id)))?;

        let status = Self::instance_status(&mut tx, game.instance_id).await?;
        ensure_structurally_editable(game.instance_id, status)?;

        sqlx::query("DELETE FROM match_games WHERE id = $1")
            .bind(game_id)
            .execute(&mut *tx)
            .await?;

        // One row at a time in ascending order keeps (instance_id, ordinal) unique
        let later: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM match_games WHERE instance_id = $1 AND ordinal > $2 ORDER BY ordinal",
        )
        .bind(game.instance_id)
        .bind(game.ordinal)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        for id in &later {
            sqlx::query("UPDATE match_games SET ordinal = ordinal - 1, updated_at = $1 WHERE id = $2")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(instance_id = %game.instance_id, ordinal = game.ordinal, renumbered = later.len(), "removed game");
        Ok(Changed::new((), vec![Invalidation::games(game.instance_id)]))
    }

    /// Updates a game's result or notes. When the match is already completed
    /// its outcome is recomputed in the same transaction.
    #[tracing::instrument(skip(self, actor, update), fields(user = %actor.user_id))]
    async fn record_game(&self, actor: &Actor, game_id: Uuid, update: GameUpdate) -> Result<Changed<MatchGame>, CoreError> {
        actor.authorize("record games")?;

        let mut tx = self.pool().begin().await?;

        let current: MatchGame = sqlx::query_as("SELECT * FROM match_games WHERE id = $1")
            .bind(game_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Game with id {} not found", game_id)))?;

        let instance_id = current.instance_id;
        let status = Self::instance_status(&mut tx, instance_id).await?;
        ensure_results_editable(instance_id, status)?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE match_games SET ");
        let mut updated = false;

        if let Some(result) = update.result {
            qb.push("result = ");
            qb.push_bind(result);
            updated = true;
        }

        if let Some(duration) = update.duration {
            if updated {
                qb.push(", ");
            }
            qb.push("duration = ");
            qb.push_bind(duration);
            updated = true;
        }

        if let Some(notes) = update.notes {
            if updated {
                qb.push(", ");
            }
            qb.push("notes = ");
            qb.push_bind(notes);
            updated = true;
        }

        if !updated {
            return Ok(Changed::new(current, Vec::new()));
        }

        qb.push(", updated_at = ");
        qb.push_bind(Utc::now());
        qb.push(" WHERE id = ");
        qb.push_bind(game_id);
        qb.build().execute(&mut *tx).await?;

        let mut invalidations = vec![Invalidation::games(instance_id)];

        if status == MatchStatus::Completed {
            let results: Vec<GameResult> = sqlx::query_scalar("SELECT result FROM match_games WHERE instance_id = $1")
                .bind(instance_id)
                .fetch_all(&mut *tx)
                .await?;
            let outcome = aggregate_outcome(results);

            sqlx::query("UPDATE match_instances SET outcome = $1, updated_at = $2 WHERE id = $3")
                .bind(&outcome)
                .bind(Utc::now())
                .bind(instance_id)
                .execute(&mut *tx)
                .await?;

            info!(%instance_id, %outcome, "recomputed outcome of completed match");
            invalidations.push(Invalidation::instance(instance_id));
        }

        let game: MatchGame = sqlx::query_as("SELECT * FROM match_games WHERE id = $1")
            .bind(game_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Changed::new(game, invalidations))
    }
}

impl SqliteRepository {
    /// Status of a match within an existing transaction.
    pub(crate) async fn instance_status(
        tx: &mut Transaction<'_, Sqlite>,
        instance_id: Uuid,
    ) -> Result<MatchStatus, CoreError> {
        sqlx::query_scalar::<_, MatchStatus>("SELECT status FROM match_instances WHERE id = $1")
            .bind(instance_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Match with id {} not found", instance_id)))
    }

    pub(crate) async fn insert_games(
        tx: &mut Transaction<'_, Sqlite>,
        games: &[MatchGame],
    ) -> Result<(), CoreError> {
        for chunk in games.chunks(rows_per_insert(GAME_COLUMNS)) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO match_games (id, instance_id, ordinal, result, duration, notes, created_at, updated_at) ",
            );
            qb.push_values(chunk, |mut row, game| {
                row.push_bind(game.id)
                    .push_bind(game.instance_id)
                    .push_bind(game.ordinal)
                    .push_bind(game.result)
                    .push_bind(game.duration.clone())
                    .push_bind(game.notes.clone())
                    .push_bind(game.created_at)
                    .push_bind(game.updated_at);
            });
            qb.build().execute(&mut **tx).await?;
        }
        Ok(())
    }
}
