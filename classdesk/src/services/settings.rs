//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::calendar::{CalendarFilter, EventType};
use crate::config::SETTINGS_FILE_NAME;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Calendar defaults applied when a session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSettings {
    /// Event types shown initially
    #[serde(default = "default_enabled_types")]
    pub enabled_types: Vec<EventType>,
}

fn default_enabled_types() -> Vec<EventType> {
    EventType::ALL.to_vec()
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            enabled_types: default_enabled_types(),
        }
    }
}

impl CalendarSettings {
    pub fn initial_filter(&self) -> CalendarFilter {
        CalendarFilter::with_types(self.enabled_types.iter().copied())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// tracing filter directive; RUST_LOG takes precedence
    #[serde(default)]
    pub filter: Option<String>,
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join(SETTINGS_FILE_NAME),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_calendar(&self) -> Result<CalendarSettings> {
        Ok(self.load().await?.calendar)
    }

    pub async fn update_calendar(&self, calendar: CalendarSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.calendar = calendar;
        self.save(&settings).await
    }
}
