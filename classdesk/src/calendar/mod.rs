//! Calendar display model
//!
//! - `mapper`: stored events to display events
//! - `filter`: type, subject and date-range filtering

pub mod filter;
pub mod mapper;

pub use filter::{CalendarFilter, FilterAction};
pub use mapper::{
    map_event, map_events, parse_event_date, CalendarViewEvent, EventResource, EventType,
    RawCalendarEvent,
};
