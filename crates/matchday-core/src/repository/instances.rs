use crate::actor::Actor;
use crate::error::CoreError;
use crate::invalidation::Invalidation;
use crate::lifecycle::{aggregate_outcome, plan_transition, OutcomeEffect};
use crate::models::{Changed, DateRange, GameResult, MatchInstance, MatchStatus};
use crate::repository::{short_id_pattern, InstanceRepository, SqliteRepository};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;
use uuid::Uuid;

#[async_trait]
impl InstanceRepository for SqliteRepository {
    async fn find_instance_by_id(&self, id: Uuid) -> Result<Option<MatchInstance>, CoreError> {
        let instance = sqlx::query_as("SELECT * FROM match_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(instance)
    }

    async fn find_instances_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<MatchInstance>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };
        let instances = sqlx::query_as("SELECT * FROM match_instances WHERE lower(hex(id)) LIKE $1")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(instances)
    }

    async fn list_instances(&self, range: DateRange) -> Result<Vec<MatchInstance>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM match_instances WHERE 1 = 1");

        if let Some(start) = range.start {
            qb.push(" AND match_date >= ");
            qb.push_bind(start);
        }
        if let Some(end) = range.end {
            qb.push(" AND match_date <= ");
            qb.push_bind(end);
        }
        qb.push(" ORDER BY match_date, match_time IS NULL, match_time, opponent");

        let instances = qb.build_query_as::<MatchInstance>().fetch_all(self.pool()).await?;
        Ok(instances)
    }

    async fn instances_for_series(&self, series_id: Uuid) -> Result<Vec<MatchInstance>, CoreError> {
        let instances = sqlx::query_as(
            "SELECT * FROM match_instances WHERE series_id = $1 ORDER BY match_date, match_time",
        )
        .bind(series_id)
        .fetch_all(self.pool())
        .await?;
        Ok(instances)
    }

    #[tracing::instrument(skip(self, actor, reason), fields(user = %actor.user_id))]
    async fn transition_instance(
        &self,
        actor: &Actor,
        id: Uuid,
        target: MatchStatus,
        reason: Option<String>,
    ) -> Result<Changed<MatchInstance>, CoreError> {
        actor.authorize("change match status")?;

        let mut tx = self.pool().begin().await?;

        let instance: MatchInstance = sqlx::query_as("SELECT * FROM match_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Match with id {} not found", id)))?;

        let outcome = match plan_transition(instance.status, target)? {
            OutcomeEffect::Recompute => {
                let results: Vec<GameResult> =
                    sqlx::query_scalar("SELECT result FROM match_games WHERE instance_id = $1")
                        .bind(id)
                        .fetch_all(&mut *tx)
                        .await?;
                Some(aggregate_outcome(results))
            }
            OutcomeEffect::Clear => None,
            OutcomeEffect::Keep => instance.outcome.clone(),
        };

        // The reason only lives as long as the cancellation does.
        let cancel_reason = if target == MatchStatus::Cancelled { reason } else { None };

        let updated: MatchInstance = sqlx::query_as(
            r#"UPDATE match_instances SET status = $1, outcome = $2, cancel_reason = $3, updated_at = $4
            WHERE id = $5 RETURNING *"#,
        )
        .bind(target)
        .bind(&outcome)
        .bind(&cancel_reason)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            instance_id = %id,
            from = %instance.status,
            to = %target,
            outcome = updated.outcome.as_deref().unwrap_or("-"),
            "match status changed"
        );

        Ok(Changed::new(updated, vec![Invalidation::instance(id)]))
    }

    #[tracing::instrument(skip(self, actor), fields(user = %actor.user_id))]
    async fn delete_instance(&self, actor: &Actor, id: Uuid) -> Result<Changed<()>, CoreError> {
        actor.authorize("delete matches")?;

        let mut tx = self.pool().begin().await?;

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM match_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CoreError::NotFound(format!("Match with id {} not found", id)));
        }

        // Delete games first so the delete does not depend on FK cascade settings
        sqlx::query("DELETE FROM match_games WHERE instance_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM match_instances WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(instance_id = %id, "deleted match");
        Ok(Changed::new((), vec![Invalidation::games(id), Invalidation::instance(id)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{GameUpdate, NewScheduleData, ScheduleOutcome};
    use crate::repository::test_support::{manager, player, repo};
    use crate::repository::{GameRepository, SchedulingRepository};
    use chrono::{NaiveDate, NaiveTime};

    async fn single_with_games(repo: &SqliteRepository, results: &[GameResult]) -> MatchInstance {
        let coach = manager();
        let data = NewScheduleData {
            opponent: "Fnatic".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
            game_count: Some(results.len() as u32),
            ..Default::default()
        };
        let ScheduleOutcome::Scheduled(report) = repo.schedule_matches(&coach, data).await.unwrap() else {
            panic!("single match always schedules");
        };
        for (game, result) in report.games.iter().zip(results) {
            let update = GameUpdate {
                result: Some(*result),
                ..Default::default()
            };
            repo.record_game(&coach, game.id, update).await.unwrap();
        }
        report.instances[0].clone()
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_complete_computes_outcome() {
            let (repo, _dir) = repo().await;
            let results = [GameResult::Win, GameResult::Win, GameResult::Loss, GameResult::NotApplicable];
            let instance = single_with_games(&repo, &results).await;

            let changed = repo
                .transition_instance(&manager(), instance.id, MatchStatus::Completed, None)
                .await
                .unwrap();

            assert_eq!(changed.value.status, MatchStatus::Completed);
            assert_eq!(changed.value.outcome.as_deref(), Some("2W-1L-0D"));
            assert_eq!(changed.invalidations, vec![Invalidation::instance(instance.id)]);
        }

        #[tokio::test]
        async fn test_complete_without_games() {
            let (repo, _dir) = repo().await;
            let instance = single_with_games(&repo, &[]).await;

            let changed = repo
                .transition_instance(&manager(), instance.id, MatchStatus::Completed, None)
                .await
                .unwrap();
            assert_eq!(changed.value.outcome.as_deref(), Some("0W-0L-0D"));
        }

        #[tokio::test]
        async fn test_reopen_clears_outcome() {
            let (repo, _dir) = repo().await;
            let coach = manager();
            let instance = single_with_games(&repo, &[GameResult::Win]).await;

            repo.transition_instance(&coach, instance.id, MatchStatus::Completed, None).await.unwrap();
            let reopened = repo
                .transition_instance(&coach, instance.id, MatchStatus::Scheduled, None)
                .await
                .unwrap();

            assert_eq!(reopened.value.status, MatchStatus::Scheduled);
            assert_eq!(reopened.value.outcome, None);
        }

        #[tokio::test]
        async fn test_cancel_stores_reason_and_reopen_clears_it() {
            let (repo, _dir) = repo().await;
            let coach = manager();
            let instance = single_with_games(&repo, &[GameResult::Win]).await;

            repo.transition_instance(&coach, instance.id, MatchStatus::Completed, None).await.unwrap();
            let cancelled = repo
                .transition_instance(&coach, instance.id, MatchStatus::Cancelled, Some("Opponent forfeited".to_string()))
                .await
                .unwrap();
            assert_eq!(cancelled.value.outcome, None);
            assert_eq!(cancelled.value.cancel_reason.as_deref(), Some("Opponent forfeited"));

            let reopened = repo
                .transition_instance(&coach, instance.id, MatchStatus::Scheduled, None)
                .await
                .unwrap();
            assert_eq!(reopened.value.cancel_reason, None);
            assert_eq!(reopened.value.outcome, None);
        }

        #[tokio::test]
        async fn test_invalid_transition_leaves_row_untouched() {
            let (repo, _dir) = repo().await;
            let coach = manager();
            let instance = single_with_games(&repo, &[]).await;
            repo.transition_instance(&coach, instance.id, MatchStatus::Cancelled, None).await.unwrap();

            let err = repo
                .transition_instance(&coach, instance.id, MatchStatus::Completed, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);

            let stored = repo.find_instance_by_id(instance.id).await.unwrap().unwrap();
            assert_eq!(stored.status, MatchStatus::Cancelled);
        }

        #[tokio::test]
        async fn test_player_cannot_transition() {
            let (repo, _dir) = repo().await;
            let instance = single_with_games(&repo, &[]).await;

            let err = repo
                .transition_instance(&player(), instance.id, MatchStatus::InProgress, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authorization);
        }

        #[tokio::test]
        async fn test_unknown_instance() {
            let (repo, _dir) = repo().await;
            let err = repo
                .transition_instance(&manager(), Uuid::now_v7(), MatchStatus::InProgress, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    mod query_tests {
        use super::*;

        async fn schedule(repo: &SqliteRepository, opponent: &str, day: u32, hour: Option<u32>) {
            let data = NewScheduleData {
                opponent: opponent.to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
                time: hour.map(|h| NaiveTime::from_hms_opt(h, 0, 0).unwrap()),
                ..Default::default()
            };
            repo.create_single(&manager(), data).await.unwrap();
        }

        #[tokio::test]
        async fn test_list_orders_by_date_then_time() {
            let (repo, _dir) = repo().await;
            schedule(&repo, "Untimed", 3, None).await;
            schedule(&repo, "Evening", 3, Some(20)).await;
            schedule(&repo, "Morning", 3, Some(9)).await;
            schedule(&repo, "Earlier day", 1, None).await;

            let opponents: Vec<String> = repo
                .list_instances(DateRange::all())
                .await
                .unwrap()
                .into_iter()
                .map(|i| i.opponent)
                .collect();
            assert_eq!(opponents, vec!["Earlier day", "Morning", "Evening", "Untimed"]);
        }

        #[tokio::test]
        async fn test_list_respects_range() {
            let (repo, _dir) = repo().await;
            for day in [1, 5, 10] {
                schedule(&repo, "Opponent", day, None).await;
            }

            let range = DateRange::between(
                NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            );
            assert_eq!(repo.list_instances(range).await.unwrap().len(), 2);
        }

        #[tokio::test]
        async fn test_delete_removes_games() {
            let (repo, _dir) = repo().await;
            let instance = single_with_games(&repo, &[GameResult::Win, GameResult::Loss]).await;

            let changed = repo.delete_instance(&manager(), instance.id).await.unwrap();

            assert_eq!(changed.invalidations.len(), 2);
            assert!(repo.find_instance_by_id(instance.id).await.unwrap().is_none());
            assert!(repo.games_for_instance(instance.id).await.unwrap().is_empty());
        }
    }
}
