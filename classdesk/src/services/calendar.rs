//! Calendar service
//!
//! Loads stored events, maps them for display and applies the current
//! filter. The filter is session state changed only through actions.

use crate::calendar::{map_events, CalendarFilter, CalendarViewEvent, FilterAction, RawCalendarEvent};
use crate::database::{CalendarEventRecord, CreateEventRequest, Repository};
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct CalendarService {
    repo: Repository,
    filter: Arc<Mutex<CalendarFilter>>,
}

impl CalendarService {
    pub fn new(repo: Repository, filter: CalendarFilter) -> Self {
        Self {
            repo,
            filter: Arc::new(Mutex::new(filter)),
        }
    }

    /// Create a new event
    pub async fn create_event(&self, req: CreateEventRequest) -> Result<CalendarEventRecord> {
        tracing::info!("Creating calendar event: {}", req.title);
        self.repo.create_event(req).await
    }

    pub async fn delete_event(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting calendar event: {}", id);
        self.repo.delete_event(id).await
    }

    /// Every stored event in display form, unfiltered
    pub async fn load_events(&self) -> Result<Vec<CalendarViewEvent>> {
        let records = self.repo.list_events().await?;
        let raw: Vec<RawCalendarEvent> = records.iter().map(RawCalendarEvent::from).collect();
        Ok(map_events(&raw))
    }

    /// Events passing the current filter
    pub async fn visible_events(&self) -> Result<Vec<CalendarViewEvent>> {
        let events = self.load_events().await?;
        let filter = self.filter().await;
        let visible = filter.filter(&events);

        tracing::debug!("{} of {} calendar event(s) visible", visible.len(), events.len());
        Ok(visible)
    }

    pub async fn filter(&self) -> CalendarFilter {
        self.filter.lock().await.clone()
    }

    /// Replace the whole filter, e.g. with new defaults from settings
    pub async fn set_filter(&self, filter: CalendarFilter) -> CalendarFilter {
        *self.filter.lock().await = filter.clone();
        filter
    }

    /// Apply a filter action and return the new filter state
    pub async fn dispatch(&self, action: FilterAction) -> CalendarFilter {
        let mut filter = self.filter.lock().await;
        *filter = filter.clone().reduce(action);
        filter.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventType;
    use crate::database::initialize_database;
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service() -> CalendarService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        CalendarService::new(Repository::new(pool), CalendarFilter::default())
    }

    fn event(title: &str, event_type: &str, subject: Option<&str>, start: &str) -> CreateEventRequest {
        CreateEventRequest {
            title: title.to_string(),
            description: None,
            event_type: event_type.to_string(),
            subject_id: subject.map(str::to_string),
            start_date: start.to_string(),
            end_date: None,
            all_day: false,
            color: None,
        }
    }

    #[tokio::test]
    async fn test_events_are_mapped() {
        let service = create_test_service().await;

        service
            .create_event(event("Prova", "exam", Some("S1"), "2024-03-10T08:00:00"))
            .await
            .unwrap();

        let events = service.load_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].end, events[0].start);
        assert_eq!(events[0].resource.category, "Avaliação");
    }

    #[tokio::test]
    async fn test_filter_actions_apply_to_visible_events() {
        let service = create_test_service().await;

        service
            .create_event(event("Aula 1", "class", Some("S1"), "2024-03-04"))
            .await
            .unwrap();
        service
            .create_event(event("Prova", "exam", Some("S1"), "2024-03-10"))
            .await
            .unwrap();
        service
            .create_event(event("Conselho", "meeting", None, "2024-03-15"))
            .await
            .unwrap();

        assert_eq!(service.visible_events().await.unwrap().len(), 3);

        service
            .dispatch(FilterAction::SetTypeEnabled {
                event_type: EventType::Meeting,
                enabled: false,
            })
            .await;
        assert_eq!(service.visible_events().await.unwrap().len(), 2);

        let filter = service
            .dispatch(FilterAction::SetFrom {
                date: NaiveDate::from_ymd_opt(2024, 3, 5),
            })
            .await;
        assert!(!filter.enabled_types.contains(&EventType::Meeting));

        let visible = service.visible_events().await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Prova");

        service.dispatch(FilterAction::Reset).await;
        assert_eq!(service.visible_events().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_set_filter_replaces_state() {
        let service = create_test_service().await;
        service
            .create_event(event("Prova", "exam", None, "2024-03-10"))
            .await
            .unwrap();
        service
            .create_event(event("Aula", "class", None, "2024-03-11"))
            .await
            .unwrap();

        let filter = service
            .set_filter(CalendarFilter::with_types([EventType::Class]))
            .await;

        assert_eq!(service.filter().await, filter);
        let visible = service.visible_events().await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Aula");
    }
}
