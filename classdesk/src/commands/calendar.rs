//! Calendar commands

use super::{parse, to_json};
use crate::app::AppState;
use crate::calendar::FilterAction;
use crate::database::CreateEventRequest;
use crate::error::{AppError, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct IdParams {
    id: String,
}

pub async fn handle(state: &AppState, method: &str, params: Value) -> Result<Value> {
    let calendar = &state.calendar;

    match method {
        "calendar.create" => {
            let req: CreateEventRequest = parse(params)?;
            if req.title.trim().is_empty() {
                return Err(AppError::Validation("title must not be empty".to_string()));
            }
            to_json(calendar.create_event(req).await?)
        }
        "calendar.delete" => {
            let IdParams { id } = parse(params)?;
            calendar.delete_event(&id).await?;
            Ok(Value::Null)
        }
        "calendar.events" => to_json(calendar.visible_events().await?),
        "calendar.filter" => {
            // Without an action this only reads the current filter
            if params.is_null() {
                return to_json(calendar.filter().await);
            }
            let action: FilterAction = parse(params)?;
            to_json(calendar.dispatch(action).await)
        }
        "calendar.reset_filter" => to_json(calendar.dispatch(FilterAction::Reset).await),
        _ => Err(AppError::UnknownMethod(method.to_string())),
    }
}
