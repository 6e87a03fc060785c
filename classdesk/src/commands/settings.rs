//! Settings commands

use super::{parse, to_json};
use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::services::CalendarSettings;
use serde_json::Value;

pub async fn handle(state: &AppState, method: &str, params: Value) -> Result<Value> {
    match method {
        "settings.get_calendar" => to_json(state.settings.get_calendar().await?),
        "settings.update_calendar" => {
            let calendar: CalendarSettings = parse(params)?;
            state.settings.update_calendar(calendar.clone()).await?;
            // New defaults take effect in the running session too
            to_json(state.calendar.set_filter(calendar.initial_filter()).await)
        }
        _ => Err(AppError::UnknownMethod(method.to_string())),
    }
}
