//! Error types for ClassDesk
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the frontend.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Assessment not found: {0}")]
    AssessmentNotFound(String),

    #[error("Student assessment not found: {0}")]
    StudentAssessmentNotFound(String),

    #[error("Calendar event not found: {0}")]
    EventNotFound(String),

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Learning material not found: {0}")]
    MaterialNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Short machine-readable code used by the command bridge
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "db_error",
            AppError::Io(_) => "io_error",
            AppError::Serialization(_) => "bad_json",
            AppError::StudentNotFound(_)
            | AppError::AssessmentNotFound(_)
            | AppError::StudentAssessmentNotFound(_)
            | AppError::EventNotFound(_)
            | AppError::PlanNotFound(_)
            | AppError::MaterialNotFound(_) => "not_found",
            AppError::Validation(_) => "bad_params",
            AppError::Fetch(_) => "fetch_failed",
            AppError::UnknownMethod(_) => "unknown_method",
            AppError::Generic(_) => "internal",
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
