//! Integration tests for ClassDesk
//!
//! These tests verify end-to-end functionality including:
//! - Grading sessions over a SQLite store
//! - Calendar events through the command bridge
//! - Request routing and error responses

use chrono::{TimeZone, Utc};
use classdesk::app;
use classdesk::commands::{handle_request, Request};
use classdesk::database::{
    create_pool, CreateAssessmentRequest, CreateStudentRequest, Repository,
};
use classdesk::services::{
    GradingService, MemoryNotifier, NotificationKind, SaveOutcome,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a test database with schema
async fn create_test_db() -> (Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let pool = create_pool(&db_path).await.unwrap();
    let repo = Repository::new(pool);

    (repo, temp_dir)
}

async fn call(state: &app::AppState, method: &str, params: Value) -> Value {
    let req: Request = serde_json::from_value(json!({
        "id": "t1",
        "method": method,
        "params": params,
    }))
    .unwrap();
    handle_request(state, req).await
}

#[tokio::test]
async fn test_grading_session_over_sqlite() {
    let (repo, _temp) = create_test_db().await;

    let ana = repo
        .create_student(CreateStudentRequest {
            name: "Ana".to_string(),
            registration: "2024-001".to_string(),
        })
        .await
        .unwrap();
    let assessment = repo
        .create_assessment(CreateAssessmentRequest {
            title: "Prova 1".to_string(),
            subject_id: None,
            total_points: Some(10.0),
            due_date: None,
        })
        .await
        .unwrap();

    let graded = repo.assign_student(&assessment.id, &ana.id).await.unwrap();
    let orphan = repo
        .assign_student(&assessment.id, "transferred-student")
        .await
        .unwrap();

    let notifier = Arc::new(MemoryNotifier::new());
    let session =
        GradingService::open(assessment.id.clone(), Arc::new(repo.clone()), notifier.clone()).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.rows.len(), 2);
    let orphan_row = snapshot.rows.iter().find(|r| r.id == orphan.id).unwrap();
    assert_eq!(orphan_row.student.name, "Unknown Student");
    assert_eq!(orphan_row.student.registration, "N/A");

    let submitted = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();
    session.set_score(&graded.id, Some(9.0)).await;
    session.set_feedback(&graded.id, "Muito bem").await;
    session.set_submitted_date(&graded.id, Some(submitted)).await;
    session.set_score(&orphan.id, Some(15.0)).await;

    let report = session.save_all().await;
    assert_eq!(report.success_count, 1);
    assert_eq!(report.error_count, 0);
    assert!(report.refreshed);

    let stored = repo.get_student_assessment(&graded.id).await.unwrap();
    assert_eq!(stored.score, Some(9.0));
    assert_eq!(stored.feedback.as_deref(), Some("Muito bem"));
    assert_eq!(stored.submitted_date, Some(submitted));

    let untouched = repo.get_student_assessment(&orphan.id).await.unwrap();
    assert_eq!(untouched.score, None);

    let orphan_row = session.row(&orphan.id).await.unwrap();
    assert!(orphan_row.is_modified);
    assert!(!orphan_row.is_valid);
    assert_eq!(orphan_row.score, Some(15.0));

    let received = notifier.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, NotificationKind::Success);
}

#[tokio::test]
async fn test_single_row_save_substitutes_zero_for_missing_score() {
    let (repo, _temp) = create_test_db().await;

    let assessment = repo
        .create_assessment(CreateAssessmentRequest {
            title: "Trabalho".to_string(),
            subject_id: None,
            total_points: None,
            due_date: None,
        })
        .await
        .unwrap();
    let record = repo.assign_student(&assessment.id, "s1").await.unwrap();

    let session = GradingService::open(
        assessment.id.clone(),
        Arc::new(repo.clone()),
        Arc::new(MemoryNotifier::new()),
    )
    .await;

    session.set_feedback(&record.id, "Entregue sem nota").await;
    assert_eq!(session.save_row(&record.id).await, SaveOutcome::Saved);

    let stored = repo.get_student_assessment(&record.id).await.unwrap();
    assert_eq!(stored.score, Some(0.0));
    assert!(stored.graded_date.is_none());
}

#[tokio::test]
async fn test_bridge_grading_flow() {
    let temp_dir = TempDir::new().unwrap();
    let state = app::setup(temp_dir.path().to_path_buf(), Arc::new(MemoryNotifier::new()))
        .await
        .unwrap();

    let student = call(
        &state,
        "students.create",
        json!({ "name": "Bruno", "registration": "2024-002" }),
    )
    .await;
    assert_eq!(student["ok"], true);
    let student_id = student["result"]["id"].as_str().unwrap().to_string();

    let assessment = call(
        &state,
        "assessments.create",
        json!({ "title": "Quiz", "total_points": 20.0 }),
    )
    .await;
    let assessment_id = assessment["result"]["id"].as_str().unwrap().to_string();

    let assigned = call(
        &state,
        "assessments.assign",
        json!({ "assessment_id": assessment_id, "student_id": student_id }),
    )
    .await;
    let row_id = assigned["result"]["id"].as_str().unwrap().to_string();

    let opened = call(&state, "grading.open", json!({ "assessment_id": assessment_id })).await;
    assert_eq!(opened["result"]["rows"].as_array().unwrap().len(), 1);
    assert_eq!(opened["result"]["max_points"], 20.0);

    let edited = call(
        &state,
        "grading.set_score",
        json!({ "assessment_id": assessment_id, "row_id": row_id, "score": 25.0 }),
    )
    .await;
    assert_eq!(edited["result"]["applied"], true);
    assert_eq!(edited["result"]["row"]["is_valid"], false);

    let skipped = call(
        &state,
        "grading.save_row",
        json!({ "assessment_id": assessment_id, "row_id": row_id }),
    )
    .await;
    assert_eq!(skipped["result"]["outcome"], "skipped");

    call(
        &state,
        "grading.set_score",
        json!({ "assessment_id": assessment_id, "row_id": row_id, "score": 18.5 }),
    )
    .await;

    let saved = call(&state, "grading.save_all", json!({ "assessment_id": assessment_id })).await;
    assert_eq!(saved["result"]["success_count"], 1);
    assert_eq!(saved["result"]["refreshed"], true);

    let rows = call(&state, "grading.rows", json!({ "assessment_id": assessment_id })).await;
    assert_eq!(rows["result"]["rows"][0]["score"], 18.5);
    assert_eq!(rows["result"]["rows"][0]["is_modified"], false);
    assert_eq!(rows["result"]["refresh_count"], 2);

    let missing = call(
        &state,
        "grading.set_score",
        json!({ "assessment_id": assessment_id, "row_id": "nope", "score": 1.0 }),
    )
    .await;
    assert_eq!(missing["ok"], true);
    assert_eq!(missing["result"]["applied"], false);
}

#[tokio::test]
async fn test_bridge_calendar_flow() {
    let temp_dir = TempDir::new().unwrap();
    let state = app::setup(temp_dir.path().to_path_buf(), Arc::new(MemoryNotifier::new()))
        .await
        .unwrap();

    for (title, event_type, subject, start) in [
        ("Prova de Física", "exam", "S1", "2024-03-10T23:00:00"),
        ("Aula de Física", "class", "S1", "2024-03-11T00:00:01"),
        ("Reunião pedagógica", "meeting", "S2", "2024-03-09"),
    ] {
        let created = call(
            &state,
            "calendar.create",
            json!({
                "title": title,
                "event_type": event_type,
                "subject_id": subject,
                "start_date": start,
            }),
        )
        .await;
        assert_eq!(created["ok"], true, "{}", created);
    }

    let all = call(&state, "calendar.events", Value::Null).await;
    assert_eq!(all["result"].as_array().unwrap().len(), 3);

    call(
        &state,
        "calendar.filter",
        json!({ "action": "set_to", "date": "2024-03-10" }),
    )
    .await;
    let until_tenth = call(&state, "calendar.events", Value::Null).await;
    assert_eq!(until_tenth["result"].as_array().unwrap().len(), 2);

    let filter = call(
        &state,
        "calendar.filter",
        json!({ "action": "set_subject", "subject_id": "S1" }),
    )
    .await;
    assert_eq!(filter["result"]["subject_id"], "S1");

    let visible = call(&state, "calendar.events", Value::Null).await;
    let visible = visible["result"].as_array().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["resource"]["category"], "Avaliação");
    assert_eq!(visible[0]["end"], visible[0]["start"]);

    call(&state, "calendar.reset_filter", Value::Null).await;
    let reset = call(&state, "calendar.events", Value::Null).await;
    assert_eq!(reset["result"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_bridge_errors() {
    let temp_dir = TempDir::new().unwrap();
    let state = app::setup(temp_dir.path().to_path_buf(), Arc::new(MemoryNotifier::new()))
        .await
        .unwrap();

    let unknown = call(&state, "grades.explode", Value::Null).await;
    assert_eq!(unknown["ok"], false);
    assert_eq!(unknown["error"]["code"], "unknown_method");

    let bad = call(&state, "students.create", json!({ "name": "Sem matrícula" })).await;
    assert_eq!(bad["error"]["code"], "bad_params");

    let missing = call(&state, "assessments.get", json!({ "id": "nope" })).await;
    assert_eq!(missing["error"]["code"], "not_found");

    let info = call(&state, "app.info", Value::Null).await;
    assert_eq!(info["result"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_bridge_unknown_assessment_is_not_kept_open() {
    let temp_dir = TempDir::new().unwrap();
    let state = app::setup(temp_dir.path().to_path_buf(), Arc::new(MemoryNotifier::new()))
        .await
        .unwrap();

    let opened = call(&state, "grading.open", json!({ "assessment_id": "ghost" })).await;
    assert_eq!(opened["ok"], false);
    assert_eq!(opened["error"]["code"], "not_found");

    let edited = call(
        &state,
        "grading.set_score",
        json!({ "assessment_id": "ghost", "row_id": "r1", "score": 1.0 }),
    )
    .await;
    assert_eq!(edited["error"]["code"], "not_found");

    let closed = call(&state, "grading.close", json!({ "assessment_id": "ghost" })).await;
    assert_eq!(closed["result"]["closed"], false);
}

#[tokio::test]
async fn test_bridge_close_discards_session() {
    let temp_dir = TempDir::new().unwrap();
    let state = app::setup(temp_dir.path().to_path_buf(), Arc::new(MemoryNotifier::new()))
        .await
        .unwrap();

    let assessment = state
        .repo
        .create_assessment(CreateAssessmentRequest {
            title: "Seminário".to_string(),
            subject_id: None,
            total_points: Some(10.0),
            due_date: None,
        })
        .await
        .unwrap();
    let row = state.repo.assign_student(&assessment.id, "s1").await.unwrap();

    call(
        &state,
        "grading.set_score",
        json!({ "assessment_id": assessment.id, "row_id": row.id, "score": 4.0 }),
    )
    .await;

    let closed = call(&state, "grading.close", json!({ "assessment_id": assessment.id })).await;
    assert_eq!(closed["result"]["closed"], true);

    // A fresh session starts from the stored values
    let rows = call(&state, "grading.rows", json!({ "assessment_id": assessment.id })).await;
    assert_eq!(rows["result"]["refresh_count"], 1);
    assert_eq!(rows["result"]["rows"][0]["score"], Value::Null);
    assert_eq!(rows["result"]["rows"][0]["is_modified"], false);

    let again = call(&state, "grading.close", json!({ "assessment_id": assessment.id })).await;
    assert_eq!(again["result"]["closed"], true);
    let none_left = call(&state, "grading.close", json!({ "assessment_id": assessment.id })).await;
    assert_eq!(none_left["result"]["closed"], false);
}

#[tokio::test]
async fn test_bridge_calendar_settings() {
    let temp_dir = TempDir::new().unwrap();
    let state = app::setup(temp_dir.path().to_path_buf(), Arc::new(MemoryNotifier::new()))
        .await
        .unwrap();

    let current = call(&state, "settings.get_calendar", Value::Null).await;
    assert_eq!(current["result"]["enabled_types"].as_array().unwrap().len(), 4);

    let filter = call(
        &state,
        "settings.update_calendar",
        json!({ "enabled_types": ["exam", "class"] }),
    )
    .await;
    assert_eq!(filter["ok"], true, "{}", filter);
    assert_eq!(filter["result"]["enabled_types"].as_array().unwrap().len(), 2);

    // Persisted for the next start
    let restarted = app::setup(temp_dir.path().to_path_buf(), Arc::new(MemoryNotifier::new()))
        .await
        .unwrap();
    let filter = call(&restarted, "calendar.filter", Value::Null).await;
    let types = filter["result"]["enabled_types"].as_array().unwrap();
    assert_eq!(types.len(), 2);
    assert!(types.contains(&json!("exam")));
}

#[tokio::test]
async fn test_bridge_plans_and_materials() {
    let temp_dir = TempDir::new().unwrap();
    let state = app::setup(temp_dir.path().to_path_buf(), Arc::new(MemoryNotifier::new()))
        .await
        .unwrap();

    let annual = call(
        &state,
        "plans.create",
        json!({ "kind": "annual", "title": "Ciências 2024", "content": "Objetivos gerais" }),
    )
    .await;
    assert_eq!(annual["ok"], true, "{}", annual);
    let annual_id = annual["result"]["id"].as_str().unwrap().to_string();

    let misplaced = call(
        &state,
        "plans.create",
        json!({ "kind": "lesson", "title": "Células", "parent_id": annual_id }),
    )
    .await;
    assert_eq!(misplaced["error"]["code"], "bad_params");

    let teaching = call(
        &state,
        "plans.create",
        json!({ "kind": "teaching", "title": "1º bimestre", "parent_id": annual_id }),
    )
    .await;
    let teaching_id = teaching["result"]["id"].as_str().unwrap().to_string();

    let teaching_plans = call(&state, "plans.list", json!({ "kind": "teaching" })).await;
    assert_eq!(teaching_plans["result"].as_array().unwrap().len(), 1);
    assert_eq!(teaching_plans["result"][0]["parent_id"], annual_id);

    let material = call(
        &state,
        "materials.create",
        json!({
            "title": "Vídeo sobre células",
            "material_type": "video",
            "plan_id": teaching_id,
            "url": "https://example.org/celulas",
        }),
    )
    .await;
    assert_eq!(material["ok"], true, "{}", material);

    let listed = call(&state, "materials.list", json!({ "plan_id": teaching_id })).await;
    assert_eq!(listed["result"].as_array().unwrap().len(), 1);

    let deleted = call(&state, "plans.delete", json!({ "id": teaching_id })).await;
    assert_eq!(deleted["ok"], true);
    let gone = call(&state, "plans.get", json!({ "id": teaching_id })).await;
    assert_eq!(gone["error"]["code"], "not_found");

    let all = call(&state, "materials.list", Value::Null).await;
    assert_eq!(all["result"][0]["plan_id"], Value::Null);
}
