use crate::calendar::{Calendar, CalendarEntry};
use crate::error::CoreError;
use crate::models::DateRange;
use crate::repository::{CalendarRepository, EventRepository, InstanceRepository, SqliteRepository};
use async_trait::async_trait;

#[async_trait]
impl CalendarRepository for SqliteRepository {
    async fn calendar_between(&self, range: DateRange) -> Result<Calendar, CoreError> {
        let instances = self.list_instances(range).await?;
        let events = self.list_events(range).await?;

        let matches: Vec<CalendarEntry> = instances.iter().map(CalendarEntry::from).collect();
        let general: Vec<CalendarEntry> = events.iter().map(CalendarEntry::from).collect();

        tracing::debug!(matches = matches.len(), events = general.len(), "merged calendar");
        Ok(Calendar::merge([matches, general]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EntrySource;
    use crate::models::{EventCategory, NewEventData, NewScheduleData};
    use crate::repository::test_support::{manager, repo};
    use crate::repository::SchedulingRepository;
    use chrono::{NaiveDate, NaiveTime};

    #[tokio::test]
    async fn test_matches_and_events_interleave() {
        let (repo, _dir) = repo().await;
        let coach = manager();
        let day = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();

        repo.create_single(
            &coach,
            NewScheduleData {
                opponent: "Vitality".to_string(),
                date: day,
                time: Some(NaiveTime::from_hms_opt(19, 0, 0).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        repo.create_event(
            &coach,
            NewEventData {
                title: "VOD review".to_string(),
                category: EventCategory::Review,
                date: day,
                start_time: None,
                end_time: None,
                description: None,
                recurrence: None,
            },
        )
        .await
        .unwrap();

        let calendar = repo.calendar_between(DateRange::between(day, day)).await.unwrap();
        let entries = calendar.events_on(day);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "vs Vitality");
        assert!(matches!(entries[0].source, EntrySource::Match { .. }));
        assert_eq!(entries[1].title, "VOD review");
    }

    #[tokio::test]
    async fn test_empty_range() {
        let (repo, _dir) = repo().await;
        let calendar = repo.calendar_between(DateRange::all()).await.unwrap();
        assert!(calendar.is_empty());
    }
}
