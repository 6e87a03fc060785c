//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to frontend.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An academic period (term, semester, school year)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AcademicPeriod {
    pub id: String,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Create academic period request
#[derive(Debug, Deserialize)]
pub struct CreatePeriodRequest {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// A subject taught within a period
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub period_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create subject request
#[derive(Debug, Deserialize)]
pub struct CreateSubjectRequest {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub period_id: Option<String>,
}

/// A student in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: String,
    pub name: String,
    /// School registration number
    pub registration: String,
    pub created_at: DateTime<Utc>,
}

/// Create student request
#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub registration: String,
}

/// An assessment (exam, assignment, project)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: String,
    pub subject_id: Option<String>,
    pub title: String,
    /// Upper bound for valid scores; `None` falls back to the default
    pub total_points: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Create assessment request
#[derive(Debug, Deserialize)]
pub struct CreateAssessmentRequest {
    pub title: String,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub total_points: Option<f64>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Planning level. Annual plans hold teaching plans, which hold lesson plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Annual,
    Teaching,
    Lesson,
}

impl PlanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanKind::Annual => "annual",
            PlanKind::Teaching => "teaching",
            PlanKind::Lesson => "lesson",
        }
    }

    /// Kind a parent plan must have, if this kind has one
    pub fn parent_kind(self) -> Option<PlanKind> {
        match self {
            PlanKind::Annual => None,
            PlanKind::Teaching => Some(PlanKind::Annual),
            PlanKind::Lesson => Some(PlanKind::Teaching),
        }
    }
}

/// An annual, teaching or lesson plan
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: String,
    /// One of "annual", "teaching", "lesson"
    pub kind: String,
    pub subject_id: Option<String>,
    pub period_id: Option<String>,
    pub parent_id: Option<String>,
    pub title: String,
    pub content: String,
    /// Only lesson plans are dated
    pub lesson_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create plan request
#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub kind: PlanKind,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub period_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub lesson_date: Option<DateTime<Utc>>,
}

/// A learning material (handout, link, video) shared with a class
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningMaterial {
    pub id: String,
    pub subject_id: Option<String>,
    pub plan_id: Option<String>,
    pub title: String,
    pub material_type: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create learning material request
#[derive(Debug, Deserialize)]
pub struct CreateMaterialRequest {
    pub title: String,
    pub material_type: String,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One student's record on one assessment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentAssessment {
    pub id: String,
    pub assessment_id: String,
    pub student_id: String,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_date: Option<DateTime<Utc>>,
    pub graded_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update sent for a student assessment.
///
/// Dates travel as ISO-8601 strings. Unset dates are omitted from the
/// payload, never sent as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStudentAssessment {
    pub score: f64,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graded_date: Option<String>,
}

/// Format a timestamp the way the store expects it (`2024-03-10T08:00:00.000Z`)
pub fn to_iso_string(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A calendar event as persisted
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CalendarEventRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// One of "class", "exam", "meeting", "other"
    pub event_type: String,
    pub subject_id: Option<String>,
    /// ISO-8601 start, as entered
    pub start_date: String,
    pub end_date: Option<String>,
    pub all_day: bool,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create calendar event request
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_type: String,
    #[serde(default)]
    pub subject_id: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_string_uses_millis_and_z() {
        let t = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();
        assert_eq!(to_iso_string(&t), "2024-03-10T08:30:00.000Z");
    }

    #[test]
    fn test_unset_dates_are_omitted() {
        let update = UpdateStudentAssessment {
            score: 7.5,
            feedback: String::new(),
            submitted_date: None,
            graded_date: Some("2024-03-10T00:00:00.000Z".to_string()),
        };

        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("submitted_date").is_none());
        assert_eq!(json["graded_date"], "2024-03-10T00:00:00.000Z");
    }
}
