//! Calendar filter state
//!
//! Filter state changes only through `FilterAction`s; `filter` derives a
//! fresh event list every time and never touches its input.

use super::mapper::{CalendarViewEvent, EventType};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFilter {
    pub enabled_types: BTreeSet<EventType>,
    pub subject_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Default for CalendarFilter {
    fn default() -> Self {
        Self {
            enabled_types: EventType::ALL.into_iter().collect(),
            subject_id: None,
            from: None,
            to: None,
        }
    }
}

/// State transitions of the calendar filter
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FilterAction {
    ToggleType { event_type: EventType },
    SetTypeEnabled { event_type: EventType, enabled: bool },
    SetSubject { subject_id: Option<String> },
    SetFrom { date: Option<NaiveDate> },
    SetTo { date: Option<NaiveDate> },
    Reset,
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999).unwrap_or_default()
}

impl CalendarFilter {
    /// Build a filter with only the given types enabled
    pub fn with_types(types: impl IntoIterator<Item = EventType>) -> Self {
        Self {
            enabled_types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn reduce(mut self, action: FilterAction) -> Self {
        match action {
            FilterAction::ToggleType { event_type } => {
                if !self.enabled_types.remove(&event_type) {
                    self.enabled_types.insert(event_type);
                }
            }
            FilterAction::SetTypeEnabled {
                event_type,
                enabled,
            } => {
                if enabled {
                    self.enabled_types.insert(event_type);
                } else {
                    self.enabled_types.remove(&event_type);
                }
            }
            FilterAction::SetSubject { subject_id } => {
                self.subject_id = subject_id.filter(|s| !s.is_empty());
            }
            FilterAction::SetFrom { date } => self.from = date,
            FilterAction::SetTo { date } => self.to = date,
            FilterAction::Reset => return Self::default(),
        }
        self
    }

    /// Every active condition must hold
    pub fn matches(&self, event: &CalendarViewEvent) -> bool {
        if !self.enabled_types.contains(&event.resource.event_type) {
            return false;
        }

        if let Some(subject) = &self.subject_id {
            if event.resource.subject_id.as_deref() != Some(subject.as_str()) {
                return false;
            }
        }

        if let Some(from) = self.from {
            if event.start < start_of_day(from) {
                return false;
            }
        }

        if let Some(to) = self.to {
            if event.start > end_of_day(to) {
                return false;
            }
        }

        true
    }

    pub fn filter(&self, events: &[CalendarViewEvent]) -> Vec<CalendarViewEvent> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}
