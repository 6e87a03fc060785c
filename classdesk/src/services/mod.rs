//! Services module
//!
//! Business logic services that coordinate between commands and repository.

pub mod calendar;
pub mod grading;
pub mod notifications;
pub mod settings;
pub mod store;

pub use calendar::CalendarService;
pub use grading::{BulkSaveReport, FetchStatus, GradingService, GradingSnapshot, SaveOutcome};
pub use notifications::{
    ChannelNotifier, MemoryNotifier, Notification, NotificationKind, Notifier, TracingNotifier,
};
pub use settings::{AppSettings, CalendarSettings, SettingsService};
pub use store::GradebookStore;
