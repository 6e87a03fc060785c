//! Stored calendar events to display events
//!
//! Stored events may spell their fields either in snake_case or camelCase
//! depending on which client wrote them; both are accepted here.

use crate::config::{
    CATEGORY_CLASS, CATEGORY_EXAM, CATEGORY_MEETING, CATEGORY_OTHER, COLOR_CLASS, COLOR_EXAM,
    COLOR_MEETING, COLOR_OTHER,
};
use crate::database::CalendarEventRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Kind of scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Class,
    Exam,
    Meeting,
    #[serde(other)]
    Other,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Class,
        EventType::Exam,
        EventType::Meeting,
        EventType::Other,
    ];

    /// Unrecognised names map to `Other`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "class" => EventType::Class,
            "exam" => EventType::Exam,
            "meeting" => EventType::Meeting,
            _ => EventType::Other,
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            EventType::Class => CATEGORY_CLASS,
            EventType::Exam => CATEGORY_EXAM,
            EventType::Meeting => CATEGORY_MEETING,
            EventType::Other => CATEGORY_OTHER,
        }
    }

    pub fn default_color(self) -> &'static str {
        match self {
            EventType::Class => COLOR_CLASS,
            EventType::Exam => COLOR_EXAM,
            EventType::Meeting => COLOR_MEETING,
            EventType::Other => COLOR_OTHER,
        }
    }
}

/// A persisted event as it arrives from storage
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default, rename = "subjectId")]
    pub subject_id_camel: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default, rename = "startDate")]
    pub start_date_camel: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, rename = "endDate")]
    pub end_date_camel: Option<String>,
    #[serde(default)]
    pub all_day: Option<bool>,
    #[serde(default, rename = "allDay")]
    pub all_day_camel: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
}

impl From<&CalendarEventRecord> for RawCalendarEvent {
    fn from(record: &CalendarEventRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            event_type: Some(record.event_type.clone()),
            subject_id: record.subject_id.clone(),
            start_date: Some(record.start_date.clone()),
            end_date: record.end_date.clone(),
            all_day: Some(record.all_day),
            color: record.color.clone(),
            ..Self::default()
        }
    }
}

/// Extra data carried alongside a display event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResource {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub description: Option<String>,
    pub category: &'static str,
    pub subject_id: Option<String>,
}

/// Event shaped for the calendar grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarViewEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    pub color: String,
    pub resource: EventResource,
}

/// Parse an event timestamp.
///
/// Accepts RFC 3339 (converted to UTC), a naive date-time, or a plain
/// date (midnight).
pub fn parse_event_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn first_present(primary: &Option<String>, secondary: &Option<String>) -> Option<String> {
    non_blank(primary).or(non_blank(secondary)).map(str::to_string)
}

/// Map one stored event. Returns `None` when it has no usable start.
pub fn map_event(raw: &RawCalendarEvent) -> Option<CalendarViewEvent> {
    let start = first_present(&raw.start_date, &raw.start_date_camel)
        .as_deref()
        .and_then(parse_event_date)?;
    let end = first_present(&raw.end_date, &raw.end_date_camel)
        .as_deref()
        .and_then(parse_event_date)
        .unwrap_or(start);

    let event_type = first_present(&raw.kind, &raw.event_type)
        .map(|t| EventType::parse(&t))
        .unwrap_or(EventType::Other);

    let color = raw
        .color
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| event_type.default_color().to_string());

    Some(CalendarViewEvent {
        id: raw.id.clone(),
        title: raw.title.clone(),
        start,
        end,
        all_day: raw.all_day.or(raw.all_day_camel).unwrap_or(false),
        color,
        resource: EventResource {
            event_type,
            description: raw.description.clone(),
            category: event_type.category(),
            subject_id: first_present(&raw.subject_id, &raw.subject_id_camel),
        },
    })
}

/// Map every stored event, skipping the ones without a usable start.
pub fn map_events(raw: &[RawCalendarEvent]) -> Vec<CalendarViewEvent> {
    raw.iter()
        .filter_map(|event| {
            let mapped = map_event(event);
            if mapped.is_none() {
                tracing::warn!("Skipping calendar event {} without a valid start date", event.id);
            }
            mapped
        })
        .collect()
}
