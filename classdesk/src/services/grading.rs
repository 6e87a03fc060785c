//! Grading service
//!
//! Owns the grade table of one assessment and coordinates its persistence.
//! Saves run one row at a time; the table lock is never held across a
//! store call, so edits stay possible while a save is in flight.

use super::notifications::{Notification, Notifier};
use super::store::GradebookStore;
use crate::database::Assessment;
use crate::error::{AppError, Result};
use crate::grading::{build_rows, max_points, GradeRow, GradeTable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Progress of one of the two backing fetches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatus {
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    Failed,
    /// Unknown row, nothing to save, invalid score, or a save already running
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSaveReport {
    pub success_count: usize,
    pub error_count: usize,
    pub refreshed: bool,
}

/// Everything the presentation layer renders for one grading table
#[derive(Debug, Clone, Serialize)]
pub struct GradingSnapshot {
    pub assessment_id: String,
    pub assessment: Option<Assessment>,
    pub max_points: f64,
    pub rows: Vec<GradeRow>,
    pub roster: FetchStatus,
    pub directory: FetchStatus,
    pub refresh_count: u64,
    pub modified_count: usize,
    pub invalid_count: usize,
}

#[derive(Default)]
struct SessionState {
    assessment: Option<Assessment>,
    table: GradeTable,
    roster: FetchStatus,
    directory: FetchStatus,
    refresh_count: u64,
}

enum Persisted {
    Saved { student: String },
    Failed { student: String, error: String },
    Skipped,
}

/// Grading session for one assessment
#[derive(Clone)]
pub struct GradingService {
    assessment_id: String,
    store: Arc<dyn GradebookStore>,
    notifier: Arc<dyn Notifier>,
    state: Arc<Mutex<SessionState>>,
}

impl GradingService {
    pub fn new(
        assessment_id: impl Into<String>,
        store: Arc<dyn GradebookStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            assessment_id: assessment_id.into(),
            store,
            notifier,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Create a session and run its first fetch. Fetch failures are kept
    /// in the session's fetch status.
    pub async fn open(
        assessment_id: impl Into<String>,
        store: Arc<dyn GradebookStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let service = Self::new(assessment_id, store, notifier);
        if let Err(e) = service.refresh().await {
            tracing::warn!(
                "Initial load of assessment {} failed: {}",
                service.assessment_id,
                e
            );
        }
        service
    }

    pub fn assessment_id(&self) -> &str {
        &self.assessment_id
    }

    pub async fn snapshot(&self) -> GradingSnapshot {
        let state = self.state.lock().await;
        GradingSnapshot {
            assessment_id: self.assessment_id.clone(),
            assessment: state.assessment.clone(),
            max_points: state.table.max_points(),
            rows: state.table.rows().to_vec(),
            roster: state.roster.clone(),
            directory: state.directory.clone(),
            refresh_count: state.refresh_count,
            modified_count: state.table.modified_count(),
            invalid_count: state.table.invalid_count(),
        }
    }

    pub async fn row(&self, id: &str) -> Option<GradeRow> {
        self.state.lock().await.table.get(id).cloned()
    }

    pub async fn refresh_count(&self) -> u64 {
        self.state.lock().await.refresh_count
    }

    // ===== Row mutators =====

    pub async fn set_score(&self, id: &str, score: Option<f64>) -> bool {
        self.state.lock().await.table.set_score(id, score)
    }

    pub async fn set_feedback(&self, id: &str, feedback: impl Into<String>) -> bool {
        self.state.lock().await.table.set_feedback(id, feedback)
    }

    pub async fn set_submitted_date(&self, id: &str, date: Option<DateTime<Utc>>) -> bool {
        self.state.lock().await.table.set_submitted_date(id, date)
    }

    pub async fn set_graded_date(&self, id: &str, date: Option<DateTime<Utc>>) -> bool {
        self.state.lock().await.table.set_graded_date(id, date)
    }

    // ===== Fetching =====

    /// Refetch the assessment, its roster and the student directory, then
    /// rebuild the rows. Results of a refresh overtaken by a newer one are
    /// discarded.
    pub async fn refresh(&self) -> Result<()> {
        let generation = {
            let mut state = self.state.lock().await;
            state.refresh_count += 1;
            state.roster.loading = true;
            state.directory.loading = true;
            state.refresh_count
        };

        tracing::debug!(
            "Refreshing grades for assessment {} (refresh #{})",
            self.assessment_id,
            generation
        );

        let roster = async {
            let assessment = self.store.get_assessment(&self.assessment_id).await?;
            let records = self.store.get_by_assessment(&self.assessment_id).await?;
            Ok::<_, AppError>((assessment, records))
        };
        let (roster, directory) = tokio::join!(roster, self.store.list_students());

        let mut state = self.state.lock().await;
        if state.refresh_count != generation {
            tracing::debug!("Discarding results of superseded refresh #{}", generation);
            return Ok(());
        }

        state.roster = FetchStatus {
            loading: false,
            error: roster.as_ref().err().map(|e| e.to_string()),
        };
        state.directory = FetchStatus {
            loading: false,
            error: directory.as_ref().err().map(|e| e.to_string()),
        };

        match (roster, directory) {
            (Ok((assessment, records)), Ok(students)) => {
                let rows = build_rows(&records, &students, &assessment);
                let max = max_points(assessment.total_points);
                state.table.replace(rows, max);
                state.assessment = Some(assessment);

                tracing::debug!(
                    "Loaded {} grade row(s) for assessment {}",
                    state.table.rows().len(),
                    self.assessment_id
                );
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(
                    "Failed to load grades for assessment {}: {}",
                    self.assessment_id,
                    e
                );
                match e {
                    AppError::AssessmentNotFound(_) => Err(e),
                    other => Err(AppError::Fetch(other.to_string())),
                }
            }
        }
    }

    // ===== Persistence =====

    async fn persist(&self, id: &str) -> Persisted {
        let (update, revision, student) = {
            let mut state = self.state.lock().await;
            let Some(row) = state.table.get_mut(id) else {
                return Persisted::Skipped;
            };
            if !row.is_pending() {
                return Persisted::Skipped;
            }
            row.is_saving = true;
            (row.to_update(), row.revision, row.student.name.clone())
        };

        let result = self.store.update_student_assessment(id, &update).await;

        let mut state = self.state.lock().await;
        let row = state.table.get_mut(id);

        match result {
            Ok(_) => {
                if let Some(row) = row {
                    row.is_saving = false;
                    if row.revision == revision {
                        row.is_modified = false;
                    } else {
                        tracing::debug!("Row {} was edited while saving; keeping it modified", id);
                    }
                }
                Persisted::Saved { student }
            }
            Err(e) => {
                tracing::error!("Failed to save grade row {}: {}", id, e);
                if let Some(row) = row {
                    row.is_saving = false;
                }
                Persisted::Failed {
                    student,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Save one row if it is modified, valid and not already saving.
    /// Failures are reported, never returned.
    pub async fn save_row(&self, id: &str) -> SaveOutcome {
        match self.persist(id).await {
            Persisted::Saved { student } => {
                self.notifier.notify(Notification::success(
                    "Grade saved",
                    format!("Grade for {} saved.", student),
                ));
                SaveOutcome::Saved
            }
            Persisted::Failed { student, error } => {
                self.notifier.notify(Notification::error(
                    "Error saving grade",
                    format!("Could not save the grade for {}: {}", student, error),
                ));
                SaveOutcome::Failed
            }
            Persisted::Skipped => {
                tracing::debug!("Nothing to save for row {}", id);
                SaveOutcome::Skipped
            }
        }
    }

    /// Save every modified, valid row, one after another. Refreshes once
    /// when at least one row was saved.
    pub async fn save_all(&self) -> BulkSaveReport {
        let ids = self.state.lock().await.table.pending_ids();

        if ids.is_empty() {
            tracing::debug!("No pending grades for assessment {}", self.assessment_id);
            return BulkSaveReport::default();
        }

        tracing::info!(
            "Saving {} grade(s) for assessment {}",
            ids.len(),
            self.assessment_id
        );

        let mut report = BulkSaveReport::default();
        for id in &ids {
            match self.persist(id).await {
                Persisted::Saved { .. } => report.success_count += 1,
                Persisted::Failed { .. } => report.error_count += 1,
                Persisted::Skipped => {}
            }
        }

        if report.success_count > 0 {
            let mut message = format!("{} grade(s) saved.", report.success_count);
            if report.error_count > 0 {
                message.push_str(&format!(" {} failed to save.", report.error_count));
            }
            self.notifier
                .notify(Notification::success("Grades saved", message));

            match self.refresh().await {
                Ok(()) => report.refreshed = true,
                Err(e) => tracing::warn!("Refresh after bulk save failed: {}", e),
            }
        } else if report.error_count > 0 {
            self.notifier.notify(Notification::error(
                "Error saving grades",
                format!("None of the {} grade(s) could be saved.", report.error_count),
            ));
        }

        tracing::info!(
            "Bulk save finished: {} saved, {} failed",
            report.success_count,
            report.error_count
        );

        report
    }
}
