//! Grade rows and the table that holds them
//!
//! A `GradeTable` is the local, editable copy of every student's record on
//! one assessment. Rows are derived from two independent fetches (the
//! assessment roster and the student directory) and mutated in place by the
//! field setters until a save clears their modified flag.

use super::validator::{is_valid_score, max_points};
use crate::config::{UNKNOWN_STUDENT_NAME, UNKNOWN_STUDENT_REGISTRATION};
use crate::database::{to_iso_string, Assessment, Student, StudentAssessment, UpdateStudentAssessment};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Student reference denormalized onto a row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRef {
    pub id: String,
    pub name: String,
    pub registration: String,
}

impl StudentRef {
    /// Stand-in for a student missing from the loaded directory
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: UNKNOWN_STUDENT_NAME.to_string(),
            registration: UNKNOWN_STUDENT_REGISTRATION.to_string(),
        }
    }
}

impl From<&Student> for StudentRef {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.name.clone(),
            registration: student.registration.clone(),
        }
    }
}

/// One student's editable grade on one assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRow {
    /// ID of the underlying student-assessment record
    pub id: String,
    pub student: StudentRef,
    pub score: Option<f64>,
    pub feedback: String,
    pub submitted_date: Option<DateTime<Utc>>,
    pub graded_date: Option<DateTime<Utc>>,
    pub is_modified: bool,
    pub is_valid: bool,
    pub is_saving: bool,
    /// Bumped on every local edit
    pub revision: u64,
}

impl GradeRow {
    /// Payload sent to the store when this row is saved
    pub fn to_update(&self) -> UpdateStudentAssessment {
        UpdateStudentAssessment {
            score: self.score.unwrap_or(0.0),
            feedback: self.feedback.clone(),
            submitted_date: self.submitted_date.as_ref().map(to_iso_string),
            graded_date: self.graded_date.as_ref().map(to_iso_string),
        }
    }

    /// Whether a save may be started for this row right now
    pub fn is_pending(&self) -> bool {
        self.is_modified && self.is_valid && !self.is_saving
    }
}

/// Derive rows from the roster and the student directory.
///
/// Students missing from the directory get a placeholder reference.
/// Validity reflects the loaded score.
pub fn build_rows(
    records: &[StudentAssessment],
    students: &[Student],
    assessment: &Assessment,
) -> Vec<GradeRow> {
    let directory: HashMap<&str, &Student> =
        students.iter().map(|s| (s.id.as_str(), s)).collect();
    let max = max_points(assessment.total_points);

    records
        .iter()
        .map(|record| {
            let student = match directory.get(record.student_id.as_str()) {
                Some(student) => StudentRef::from(*student),
                None => {
                    tracing::warn!(
                        "Student {} not found in directory for record {}",
                        record.student_id,
                        record.id
                    );
                    StudentRef::unknown(&record.student_id)
                }
            };

            GradeRow {
                id: record.id.clone(),
                student,
                score: record.score,
                feedback: record.feedback.clone().unwrap_or_default(),
                submitted_date: record.submitted_date,
                graded_date: record.graded_date,
                is_modified: false,
                is_valid: is_valid_score(record.score, max),
                is_saving: false,
                revision: 0,
            }
        })
        .collect()
}

/// Local row collection for one assessment
#[derive(Debug, Clone)]
pub struct GradeTable {
    rows: Vec<GradeRow>,
    max_points: f64,
}

impl Default for GradeTable {
    fn default() -> Self {
        Self::new(Vec::new(), max_points(None))
    }
}

impl GradeTable {
    pub fn new(rows: Vec<GradeRow>, max_points: f64) -> Self {
        Self { rows, max_points }
    }

    pub fn rows(&self) -> &[GradeRow] {
        &self.rows
    }

    pub fn max_points(&self) -> f64 {
        self.max_points
    }

    pub fn get(&self, id: &str) -> Option<&GradeRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut GradeRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    fn edit(&mut self, id: &str, apply: impl FnOnce(&mut GradeRow)) -> bool {
        match self.get_mut(id) {
            Some(row) => {
                apply(row);
                row.is_modified = true;
                row.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Set a row's score and recompute its validity.
    /// Returns false when no row has this ID.
    pub fn set_score(&mut self, id: &str, score: Option<f64>) -> bool {
        let max = self.max_points;
        self.edit(id, |row| {
            row.score = score;
            row.is_valid = is_valid_score(score, max);
        })
    }

    pub fn set_feedback(&mut self, id: &str, feedback: impl Into<String>) -> bool {
        let feedback = feedback.into();
        self.edit(id, |row| row.feedback = feedback)
    }

    pub fn set_submitted_date(&mut self, id: &str, date: Option<DateTime<Utc>>) -> bool {
        self.edit(id, |row| row.submitted_date = date)
    }

    pub fn set_graded_date(&mut self, id: &str, date: Option<DateTime<Utc>>) -> bool {
        self.edit(id, |row| row.graded_date = date)
    }

    /// IDs of rows a bulk save should send, in table order
    pub fn pending_ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| r.is_pending())
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn modified_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_modified).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_valid).count()
    }

    /// Replace the table with freshly fetched rows.
    ///
    /// Rows that still carry unsaved edits keep their local values and
    /// only pick up the fresh student reference. In-flight flags and
    /// revisions always carry over. Rows absent from the fetch are dropped.
    pub fn replace(&mut self, fresh: Vec<GradeRow>, max_points: f64) {
        let mut previous: HashMap<String, GradeRow> =
            self.rows.drain(..).map(|r| (r.id.clone(), r)).collect();

        let mut kept = 0usize;
        self.rows = fresh
            .into_iter()
            .map(|mut row| {
                if let Some(local) = previous.remove(&row.id) {
                    if local.is_modified {
                        kept += 1;
                        row.score = local.score;
                        row.feedback = local.feedback;
                        row.submitted_date = local.submitted_date;
                        row.graded_date = local.graded_date;
                        row.is_modified = true;
                    }
                    row.is_saving = local.is_saving;
                    row.revision = local.revision;
                }
                row.is_valid = is_valid_score(row.score, max_points);
                row
            })
            .collect();
        self.max_points = max_points;

        if kept > 0 {
            tracing::debug!("Kept local edits on {} row(s) across refresh", kept);
        }
        if !previous.is_empty() {
            tracing::debug!("Dropped {} row(s) no longer on the roster", previous.len());
        }
    }
}
