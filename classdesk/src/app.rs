//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::DATABASE_FILE_NAME;
use crate::database::{create_pool, Repository};
use crate::error::{AppError, Result};
use crate::services::{CalendarService, GradingService, Notifier, SettingsService};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub repo: Repository,
    pub settings: SettingsService,
    pub calendar: CalendarService,
    notifier: Arc<dyn Notifier>,
    grading_sessions: Arc<Mutex<HashMap<String, GradingService>>>,
}

impl AppState {
    /// Grading session of an assessment, opened and loaded on first use.
    /// Sessions of assessments that do not exist are never kept.
    pub async fn grading(&self, assessment_id: &str) -> Result<GradingService> {
        let mut sessions = self.grading_sessions.lock().await;
        if let Some(session) = sessions.get(assessment_id) {
            return Ok(session.clone());
        }

        tracing::info!("Opening grading session for assessment {}", assessment_id);
        let session = GradingService::new(
            assessment_id,
            Arc::new(self.repo.clone()),
            self.notifier.clone(),
        );
        match session.refresh().await {
            Err(e @ AppError::AssessmentNotFound(_)) => return Err(e),
            // Other failures stay visible in the session's fetch status
            Err(e) => tracing::warn!("Initial load of assessment {} failed: {}", assessment_id, e),
            Ok(()) => {}
        }

        sessions.insert(assessment_id.to_string(), session.clone());
        Ok(session)
    }

    /// Open a grading session, refreshing it if it is already open
    pub async fn open_grading(&self, assessment_id: &str) -> Result<GradingService> {
        let existing = self.grading_sessions.lock().await.get(assessment_id).cloned();
        match existing {
            Some(session) => {
                if let Err(e) = session.refresh().await {
                    tracing::warn!("Refresh of assessment {} failed: {}", assessment_id, e);
                }
                Ok(session)
            }
            None => self.grading(assessment_id).await,
        }
    }

    /// Drop the grading session of an assessment. Unsaved edits are lost.
    pub async fn close_grading(&self, assessment_id: &str) -> bool {
        let closed = self
            .grading_sessions
            .lock()
            .await
            .remove(assessment_id)
            .is_some();
        if closed {
            tracing::info!("Closed grading session for assessment {}", assessment_id);
        }
        closed
    }
}

/// Application setup - called once on startup
pub async fn setup(data_dir: PathBuf, notifier: Arc<dyn Notifier>) -> Result<AppState> {
    tracing::info!("Initializing application in {:?}", data_dir);

    std::fs::create_dir_all(&data_dir)?;

    let settings = SettingsService::new(data_dir.clone());
    let calendar_settings = settings.get_calendar().await?;

    let pool = create_pool(&data_dir.join(DATABASE_FILE_NAME)).await?;
    let repo = Repository::new(pool);

    let calendar = CalendarService::new(repo.clone(), calendar_settings.initial_filter());

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        data_dir,
        repo,
        settings,
        calendar,
        notifier,
        grading_sessions: Arc::new(Mutex::new(HashMap::new())),
    })
}
