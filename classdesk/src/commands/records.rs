//! Record-keeping commands
//!
//! Academic periods, subjects, the student directory, assessments, plans
//! and learning materials.

use super::{parse, to_json};
use crate::app::AppState;
use crate::database::{
    CreateAssessmentRequest, CreateMaterialRequest, CreatePeriodRequest, CreatePlanRequest,
    CreateStudentRequest, CreateSubjectRequest, PlanKind,
};
use crate::error::{AppError, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct IdParams {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListAssessmentsParams {
    #[serde(default)]
    subject_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListPlansParams {
    #[serde(default)]
    kind: Option<PlanKind>,
    #[serde(default)]
    subject_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListMaterialsParams {
    #[serde(default)]
    subject_id: Option<String>,
    #[serde(default)]
    plan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssignParams {
    assessment_id: String,
    student_id: String,
}

/// Params of list methods are optional
fn parse_filter<T: Default + serde::de::DeserializeOwned>(params: Value) -> Result<T> {
    if params.is_null() {
        Ok(T::default())
    } else {
        parse(params)
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub async fn handle(state: &AppState, method: &str, params: Value) -> Result<Value> {
    let repo = &state.repo;

    match method {
        "periods.create" => {
            let req: CreatePeriodRequest = parse(params)?;
            require_text("name", &req.name)?;
            to_json(repo.create_period(req).await?)
        }
        "periods.list" => to_json(repo.list_periods().await?),

        "subjects.create" => {
            let req: CreateSubjectRequest = parse(params)?;
            require_text("name", &req.name)?;
            to_json(repo.create_subject(req).await?)
        }
        "subjects.list" => to_json(repo.list_subjects().await?),

        "students.create" => {
            let req: CreateStudentRequest = parse(params)?;
            require_text("name", &req.name)?;
            require_text("registration", &req.registration)?;
            to_json(repo.create_student(req).await?)
        }
        "students.list" => to_json(repo.list_students().await?),

        "assessments.create" => {
            let req: CreateAssessmentRequest = parse(params)?;
            require_text("title", &req.title)?;
            to_json(repo.create_assessment(req).await?)
        }
        "assessments.get" => {
            let IdParams { id } = parse(params)?;
            to_json(repo.get_assessment(&id).await?)
        }
        "assessments.list" => {
            let filter: ListAssessmentsParams = parse_filter(params)?;
            to_json(repo.list_assessments(filter.subject_id.as_deref()).await?)
        }
        "assessments.assign" => {
            let AssignParams {
                assessment_id,
                student_id,
            } = parse(params)?;
            repo.get_student(&student_id).await?;
            to_json(repo.assign_student(&assessment_id, &student_id).await?)
        }

        "plans.create" => {
            let req: CreatePlanRequest = parse(params)?;
            require_text("title", &req.title)?;
            to_json(repo.create_plan(req).await?)
        }
        "plans.get" => {
            let IdParams { id } = parse(params)?;
            to_json(repo.get_plan(&id).await?)
        }
        "plans.list" => {
            let filter: ListPlansParams = parse_filter(params)?;
            to_json(repo.list_plans(filter.kind, filter.subject_id.as_deref()).await?)
        }
        "plans.delete" => {
            let IdParams { id } = parse(params)?;
            repo.delete_plan(&id).await?;
            Ok(Value::Null)
        }

        "materials.create" => {
            let req: CreateMaterialRequest = parse(params)?;
            require_text("title", &req.title)?;
            require_text("material_type", &req.material_type)?;
            to_json(repo.create_material(req).await?)
        }
        "materials.list" => {
            let filter: ListMaterialsParams = parse_filter(params)?;
            to_json(
                repo.list_materials(filter.subject_id.as_deref(), filter.plan_id.as_deref())
                    .await?,
            )
        }
        "materials.delete" => {
            let IdParams { id } = parse(params)?;
            repo.delete_material(&id).await?;
            Ok(Value::Null)
        }

        _ => Err(AppError::UnknownMethod(method.to_string())),
    }
}
