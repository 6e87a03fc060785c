//! Gradebook store capability
//!
//! The grading workflow only needs four operations from persistence.
//! `Repository` provides them over SQLite; tests substitute their own.

use crate::database::{Assessment, Repository, Student, StudentAssessment, UpdateStudentAssessment};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GradebookStore: Send + Sync {
    /// Every student record of one assessment
    async fn get_by_assessment(&self, assessment_id: &str) -> Result<Vec<StudentAssessment>>;

    async fn get_assessment(&self, assessment_id: &str) -> Result<Assessment>;

    /// The whole student directory
    async fn list_students(&self) -> Result<Vec<Student>>;

    /// Persist one row's fields. Either every field is written or the call fails.
    async fn update_student_assessment(
        &self,
        id: &str,
        update: &UpdateStudentAssessment,
    ) -> Result<StudentAssessment>;
}

#[async_trait]
impl GradebookStore for Repository {
    async fn get_by_assessment(&self, assessment_id: &str) -> Result<Vec<StudentAssessment>> {
        Repository::list_by_assessment(self, assessment_id).await
    }

    async fn get_assessment(&self, assessment_id: &str) -> Result<Assessment> {
        Repository::get_assessment(self, assessment_id).await
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        Repository::list_students(self).await
    }

    async fn update_student_assessment(
        &self,
        id: &str,
        update: &UpdateStudentAssessment,
    ) -> Result<StudentAssessment> {
        Repository::update_student_assessment(self, id, update).await
    }
}
