use crate::actor::Actor;
use crate::error::CoreError;
use crate::invalidation::Invalidation;
use crate::models::{Changed, DateRange, EventOutcome, GeneralEvent, NewEventData};
use crate::repository::{rows_per_insert, short_id_pattern, EventRepository, SqliteRepository};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;
use uuid::Uuid;

const EVENT_COLUMNS: usize = 10;

#[async_trait]
impl EventRepository for SqliteRepository {
    /// Persists one independent event row per occurrence. Recurring events
    /// share no series link; each row is edited and deleted on its own.
    #[tracing::instrument(skip(self, actor, data), fields(user = %actor.user_id, title = %data.title))]
    async fn create_event(&self, actor: &Actor, data: NewEventData) -> Result<EventOutcome, CoreError> {
        actor.authorize("create events")?;

        if data.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("Event title cannot be empty".to_string()));
        }
        if let (Some(start), Some(end)) = (data.start_time, data.end_time) {
            if end < start {
                return Err(CoreError::InvalidInput(format!(
                    "Event ends ({}) before it starts ({})",
                    end.format("%H:%M"),
                    start.format("%H:%M")
                )));
            }
        }

        let dates = self
            .materialization_manager()
            .plan_occurrences(data.date, data.recurrence.as_ref())?;
        if dates.is_empty() {
            info!(anchor = %data.date, "event recurrence has no occurrences, nothing created");
            return Ok(EventOutcome::NoOccurrences);
        }

        let now = Utc::now();
        let events: Vec<GeneralEvent> = dates
            .into_iter()
            .map(|event_date| GeneralEvent {
                id: Uuid::now_v7(),
                owner_id: actor.user_id,
                title: data.title.clone(),
                category: data.category,
                event_date,
                start_time: data.start_time,
                end_time: data.end_time,
                description: data.description.clone(),
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut tx = self.pool().begin().await?;

        for chunk in events.chunks(rows_per_insert(EVENT_COLUMNS)) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO general_events (id, owner_id, title, category, event_date, start_time, end_time, description, created_at, updated_at) ",
            );
            qb.push_values(chunk, |mut row, event| {
                row.push_bind(event.id)
                    .push_bind(event.owner_id)
                    .push_bind(event.title.clone())
                    .push_bind(event.category)
                    .push_bind(event.event_date)
                    .push_bind(event.start_time)
                    .push_bind(event.end_time)
                    .push_bind(event.description.clone())
                    .push_bind(event.created_at)
                    .push_bind(event.updated_at);
            });
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(events = events.len(), category = %data.category, "created general events");

        let invalidations = events.iter().map(|e| Invalidation::event(e.id)).collect();
        Ok(EventOutcome::Created(Changed::new(events, invalidations)))
    }

    async fn find_event_by_id(&self, id: Uuid) -> Result<Option<GeneralEvent>, CoreError> {
        let event = sqlx::query_as("SELECT * FROM general_events WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(event)
    }

    async fn find_events_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<GeneralEvent>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };
        let events = sqlx::query_as("SELECT * FROM general_events WHERE lower(hex(id)) LIKE $1")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(events)
    }

    async fn list_events(&self, range: DateRange) -> Result<Vec<GeneralEvent>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM general_events WHERE 1 = 1");

        if let Some(start) = range.start {
            qb.push(" AND event_date >= ");
            qb.push_bind(start);
        }
        if let Some(end) = range.end {
            qb.push(" AND event_date <= ");
            qb.push_bind(end);
        }
        qb.push(" ORDER BY event_date, start_time IS NULL, start_time, title");

        let events = qb.build_query_as::<GeneralEvent>().fetch_all(self.pool()).await?;
        Ok(events)
    }

    #[tracing::instrument(skip(self, actor), fields(user = %actor.user_id))]
    async fn delete_event(&self, actor: &Actor, id: Uuid) -> Result<Changed<()>, CoreError> {
        actor.authorize("delete events")?;

        let result = sqlx::query("DELETE FROM general_events WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Event with id {} not found", id)));
        }

        info!(event_id = %id, "deleted event");
        Ok(Changed::new((), vec![Invalidation::event(id)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{EventCategory, RepeatRule};
    use crate::repository::test_support::{manager, player, repo};
    use chrono::{NaiveDate, NaiveTime};

    fn practice(recurrence: Option<RepeatRule>) -> NewEventData {
        NewEventData {
            title: "Scrim block".to_string(),
            category: EventCategory::Practice,
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            start_time: Some(NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
            end_time: Some(NaiveTime::from_hms_opt(21, 0, 0).unwrap()),
            description: None,
            recurrence,
        }
    }

    fn created(outcome: EventOutcome) -> Changed<Vec<GeneralEvent>> {
        match outcome {
            EventOutcome::Created(changed) => changed,
            EventOutcome::NoOccurrences => panic!("expected events to be created"),
        }
    }

    #[tokio::test]
    async fn test_single_event() {
        let (repo, _dir) = repo().await;
        let changed = created(repo.create_event(&manager(), practice(None)).await.unwrap());

        assert_eq!(changed.value.len(), 1);
        assert_eq!(changed.invalidations, vec![Invalidation::event(changed.value[0].id)]);
        assert_eq!(repo.list_events(DateRange::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recurring_event_creates_independent_rows() {
        let (repo, _dir) = repo().await;
        let rule = RepeatRule {
            weekdays: "tue,thu".parse().unwrap(),
            until: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        };

        let changed = created(repo.create_event(&manager(), practice(Some(rule))).await.unwrap());
        assert_eq!(changed.value.len(), 4);

        // Deleting one occurrence leaves the others alone.
        repo.delete_event(&manager(), changed.value[0].id).await.unwrap();
        assert_eq!(repo.list_events(DateRange::all()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_recurrence_creates_nothing() {
        let (repo, _dir) = repo().await;
        let rule = RepeatRule {
            weekdays: "sat".parse().unwrap(),
            until: NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
        };

        let outcome = repo.create_event(&manager(), practice(Some(rule))).await.unwrap();
        assert!(matches!(outcome, EventOutcome::NoOccurrences));
        assert!(repo.list_events(DateRange::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let (repo, _dir) = repo().await;
        let mut data = practice(None);
        data.end_time = Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        let err = repo.create_event(&manager(), data).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_player_cannot_create_or_delete() {
        let (repo, _dir) = repo().await;
        let err = repo.create_event(&player(), practice(None)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = repo.delete_event(&player(), Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_delete_unknown_event() {
        let (repo, _dir) = repo().await;
        let err = repo.delete_event(&manager(), Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
