//! Repository layer for database operations
//!
//! CRUD operations for periods, subjects, students, assessments,
//! student-assessment records and calendar events.

use super::models::*;
use crate::calendar::parse_event_date;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

fn parse_iso(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| AppError::Validation(format!("{} is not an ISO-8601 timestamp: {}", field, e)))
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Academic periods =====

    /// Create an academic period
    pub async fn create_period(&self, req: CreatePeriodRequest) -> Result<AcademicPeriod> {
        if req.end_date < req.start_date {
            return Err(AppError::Validation(
                "period end date is before its start date".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();

        let period = sqlx::query_as::<_, AcademicPeriod>(
            r#"
            INSERT INTO academic_periods (id, name, start_date, end_date, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.name)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created academic period: {}", id);
        Ok(period)
    }

    /// List academic periods, most recent first
    pub async fn list_periods(&self) -> Result<Vec<AcademicPeriod>> {
        let periods = sqlx::query_as::<_, AcademicPeriod>(
            "SELECT * FROM academic_periods ORDER BY start_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    // ===== Subjects =====

    /// Create a subject
    pub async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject> {
        let id = Uuid::new_v4().to_string();

        let subject = sqlx::query_as::<_, Subject>(
            r#"
            INSERT INTO subjects (id, name, code, period_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.name)
        .bind(&req.code)
        .bind(&req.period_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created subject: {}", id);
        Ok(subject)
    }

    /// List subjects by name
    pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(subjects)
    }

    // ===== Students =====

    /// Create a student
    pub async fn create_student(&self, req: CreateStudentRequest) -> Result<Student> {
        let id = Uuid::new_v4().to_string();

        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (id, name, registration, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.name)
        .bind(&req.registration)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created student: {}", id);
        Ok(student)
    }

    /// Get a student by ID
    pub async fn get_student(&self, id: &str) -> Result<Student> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::StudentNotFound(id.to_string()))
    }

    /// List the whole student directory
    pub async fn list_students(&self) -> Result<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>("SELECT * FROM students ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(students)
    }

    // ===== Assessments =====

    /// Create an assessment
    pub async fn create_assessment(&self, req: CreateAssessmentRequest) -> Result<Assessment> {
        if let Some(points) = req.total_points {
            if !points.is_finite() || points < 0.0 {
                return Err(AppError::Validation(format!(
                    "total points must be a non-negative number, got {}",
                    points
                )));
            }
        }

        let id = Uuid::new_v4().to_string();

        let assessment = sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments (id, subject_id, title, total_points, due_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.subject_id)
        .bind(&req.title)
        .bind(req.total_points)
        .bind(req.due_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created assessment: {}", id);
        Ok(assessment)
    }

    /// Get an assessment by ID
    pub async fn get_assessment(&self, id: &str) -> Result<Assessment> {
        sqlx::query_as::<_, Assessment>("SELECT * FROM assessments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::AssessmentNotFound(id.to_string()))
    }

    /// List assessments, optionally restricted to one subject
    pub async fn list_assessments(&self, subject_id: Option<&str>) -> Result<Vec<Assessment>> {
        let assessments = match subject_id {
            Some(subject_id) => {
                sqlx::query_as::<_, Assessment>(
                    "SELECT * FROM assessments WHERE subject_id = ? ORDER BY created_at ASC",
                )
                .bind(subject_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Assessment>("SELECT * FROM assessments ORDER BY created_at ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(assessments)
    }

    // ===== Student assessments =====

    /// Attach a student to an assessment. Returns the existing record when
    /// the pair is already attached.
    pub async fn assign_student(
        &self,
        assessment_id: &str,
        student_id: &str,
    ) -> Result<StudentAssessment> {
        let existing = sqlx::query_as::<_, StudentAssessment>(
            "SELECT * FROM student_assessments WHERE assessment_id = ? AND student_id = ?",
        )
        .bind(assessment_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = existing {
            return Ok(record);
        }

        // Surface a typed error instead of a foreign key failure
        self.get_assessment(assessment_id).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let record = sqlx::query_as::<_, StudentAssessment>(
            r#"
            INSERT INTO student_assessments
                (id, assessment_id, student_id, score, feedback, submitted_date, graded_date, created_at, updated_at)
            VALUES (?, ?, ?, NULL, NULL, NULL, NULL, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(assessment_id)
        .bind(student_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            "Assigned student {} to assessment {} as {}",
            student_id,
            assessment_id,
            id
        );
        Ok(record)
    }

    /// Get a student assessment by ID
    pub async fn get_student_assessment(&self, id: &str) -> Result<StudentAssessment> {
        sqlx::query_as::<_, StudentAssessment>("SELECT * FROM student_assessments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::StudentAssessmentNotFound(id.to_string()))
    }

    /// List every student record of one assessment
    pub async fn list_by_assessment(&self, assessment_id: &str) -> Result<Vec<StudentAssessment>> {
        let records = sqlx::query_as::<_, StudentAssessment>(
            r#"
            SELECT * FROM student_assessments
            WHERE assessment_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Apply a grading update. Dates missing from the update keep their
    /// stored value.
    pub async fn update_student_assessment(
        &self,
        id: &str,
        update: &UpdateStudentAssessment,
    ) -> Result<StudentAssessment> {
        let submitted = update
            .submitted_date
            .as_deref()
            .map(|d| parse_iso("submitted_date", d))
            .transpose()?;
        let graded = update
            .graded_date
            .as_deref()
            .map(|d| parse_iso("graded_date", d))
            .transpose()?;

        // Build dynamic update query
        let mut query =
            "UPDATE student_assessments SET score = ?, feedback = ?, updated_at = ?".to_string();
        if submitted.is_some() {
            query.push_str(", submitted_date = ?");
        }
        if graded.is_some() {
            query.push_str(", graded_date = ?");
        }
        query.push_str(" WHERE id = ?");

        let mut q = sqlx::query(&query)
            .bind(update.score)
            .bind(&update.feedback)
            .bind(Utc::now());
        if let Some(date) = submitted {
            q = q.bind(date);
        }
        if let Some(date) = graded {
            q = q.bind(date);
        }

        let rows_affected = q.bind(id).execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::StudentAssessmentNotFound(id.to_string()));
        }

        tracing::debug!("Updated student assessment: {}", id);
        self.get_student_assessment(id).await
    }

    // ===== Plans =====

    /// Create a plan. A parent must be one level up: annual above teaching,
    /// teaching above lesson.
    pub async fn create_plan(&self, req: CreatePlanRequest) -> Result<Plan> {
        if req.lesson_date.is_some() && req.kind != PlanKind::Lesson {
            return Err(AppError::Validation(
                "only lesson plans have a lesson date".to_string(),
            ));
        }

        if let Some(parent_id) = req.parent_id.as_deref() {
            let parent = self.get_plan(parent_id).await?;
            let expected = req.kind.parent_kind().ok_or_else(|| {
                AppError::Validation("annual plans have no parent".to_string())
            })?;
            if parent.kind != expected.as_str() {
                return Err(AppError::Validation(format!(
                    "a {} plan must belong to a {} plan, not a {} plan",
                    req.kind.as_str(),
                    expected.as_str(),
                    parent.kind
                )));
            }
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let plan = sqlx::query_as::<_, Plan>(
            r#"
            INSERT INTO plans
                (id, kind, subject_id, period_id, parent_id, title, content, lesson_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(req.kind.as_str())
        .bind(&req.subject_id)
        .bind(&req.period_id)
        .bind(&req.parent_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.lesson_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created {} plan: {}", req.kind.as_str(), id);
        Ok(plan)
    }

    pub async fn get_plan(&self, id: &str) -> Result<Plan> {
        sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::PlanNotFound(id.to_string()))
    }

    /// List plans, optionally of one kind and/or one subject
    pub async fn list_plans(
        &self,
        kind: Option<PlanKind>,
        subject_id: Option<&str>,
    ) -> Result<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT * FROM plans
            WHERE (?1 IS NULL OR kind = ?1) AND (?2 IS NULL OR subject_id = ?2)
            ORDER BY lesson_date ASC, created_at ASC
            "#,
        )
        .bind(kind.map(PlanKind::as_str))
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }

    /// Delete a plan. Child plans and materials are detached, not deleted.
    pub async fn delete_plan(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM plans WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::PlanNotFound(id.to_string()));
        }

        tracing::debug!("Deleted plan: {}", id);
        Ok(())
    }

    // ===== Learning materials =====

    pub async fn create_material(&self, req: CreateMaterialRequest) -> Result<LearningMaterial> {
        if let Some(plan_id) = req.plan_id.as_deref() {
            self.get_plan(plan_id).await?;
        }

        let id = Uuid::new_v4().to_string();

        let material = sqlx::query_as::<_, LearningMaterial>(
            r#"
            INSERT INTO learning_materials
                (id, subject_id, plan_id, title, material_type, url, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.subject_id)
        .bind(&req.plan_id)
        .bind(&req.title)
        .bind(&req.material_type)
        .bind(&req.url)
        .bind(&req.description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created learning material: {}", id);
        Ok(material)
    }

    /// List materials, optionally of one subject and/or one plan
    pub async fn list_materials(
        &self,
        subject_id: Option<&str>,
        plan_id: Option<&str>,
    ) -> Result<Vec<LearningMaterial>> {
        let materials = sqlx::query_as::<_, LearningMaterial>(
            r#"
            SELECT * FROM learning_materials
            WHERE (?1 IS NULL OR subject_id = ?1) AND (?2 IS NULL OR plan_id = ?2)
            ORDER BY title ASC
            "#,
        )
        .bind(subject_id)
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(materials)
    }

    pub async fn delete_material(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM learning_materials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::MaterialNotFound(id.to_string()));
        }

        tracing::debug!("Deleted learning material: {}", id);
        Ok(())
    }

    // ===== Calendar events =====

    /// Create a calendar event
    pub async fn create_event(&self, req: CreateEventRequest) -> Result<CalendarEventRecord> {
        let start = parse_event_date(&req.start_date).ok_or_else(|| {
            AppError::Validation(format!("unrecognised start date: {}", req.start_date))
        })?;
        if let Some(end) = req.end_date.as_deref() {
            let end = parse_event_date(end)
                .ok_or_else(|| AppError::Validation(format!("unrecognised end date: {}", end)))?;
            if end < start {
                return Err(AppError::Validation(
                    "event ends before it starts".to_string(),
                ));
            }
        }

        let id = Uuid::new_v4().to_string();

        let event = sqlx::query_as::<_, CalendarEventRecord>(
            r#"
            INSERT INTO calendar_events
                (id, title, description, event_type, subject_id, start_date, end_date, all_day, color, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.event_type)
        .bind(&req.subject_id)
        .bind(&req.start_date)
        .bind(&req.end_date)
        .bind(req.all_day)
        .bind(&req.color)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created calendar event: {}", id);
        Ok(event)
    }

    /// List all calendar events by start
    pub async fn list_events(&self) -> Result<Vec<CalendarEventRecord>> {
        let events = sqlx::query_as::<_, CalendarEventRecord>(
            "SELECT * FROM calendar_events ORDER BY start_date ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Delete a calendar event
    pub async fn delete_event(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM calendar_events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::EventNotFound(id.to_string()));
        }

        tracing::debug!("Deleted calendar event: {}", id);
        Ok(())
    }
}
