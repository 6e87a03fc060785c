//! Application configuration constants
//!
//! Central location for grading defaults, calendar presentation values,
//! and limits used by the command bridge.

// ===== Grading =====

/// Maximum points assumed when an assessment has no total points recorded
pub const DEFAULT_TOTAL_POINTS: f64 = 100.0;

/// Name shown for a grade row whose student is missing from the directory
pub const UNKNOWN_STUDENT_NAME: &str = "Unknown Student";

/// Registration shown for a grade row whose student is missing from the directory
pub const UNKNOWN_STUDENT_REGISTRATION: &str = "N/A";

// ===== Calendar =====

/// Display category for class events
pub const CATEGORY_CLASS: &str = "Aula";
/// Display category for exam events
pub const CATEGORY_EXAM: &str = "Avaliação";
/// Display category for meeting events
pub const CATEGORY_MEETING: &str = "Reunião";
/// Display category for everything else
pub const CATEGORY_OTHER: &str = "Outro";

/// Fallback colors per event type, used when the stored event has none
pub const COLOR_CLASS: &str = "#3b82f6";
pub const COLOR_EXAM: &str = "#ef4444";
pub const COLOR_MEETING: &str = "#10b981";
pub const COLOR_OTHER: &str = "#6b7280";

// ===== Bridge Limits =====

/// Longest request line accepted by the command bridge (1 MiB).
/// Larger payloads are answered with an error instead of being parsed.
pub const MAX_REQUEST_LINE_BYTES: usize = 1024 * 1024;

/// Maximum length for free-text feedback on a grade
pub const MAX_FEEDBACK_LENGTH: usize = 10_000;

// ===== Storage =====

/// Database file name inside the data directory
pub const DATABASE_FILE_NAME: &str = "classdesk.db";

/// Settings file name inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "CLASSDESK_DATA_DIR";

/// Default tracing filter when neither RUST_LOG nor settings provide one
pub const DEFAULT_LOG_FILTER: &str = "classdesk=debug,info";
