//! Commands exposed to the frontend
//!
//! Requests arrive as one JSON object per line and are routed by method
//! name to the submodules:
//! - `records`: periods, subjects, students, assessments, plans and materials
//! - `grading`: grade table edits and saves
//! - `calendar`: calendar events and filter state
//! - `settings`: persisted defaults

pub mod calendar;
pub mod grading;
pub mod records;
pub mod settings;

use crate::app::AppState;
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Incoming bridge request
#[derive(Debug, Deserialize)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

pub fn ok(id: &str, result: Value) -> Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(id: &str, code: &str, message: impl Into<String>) -> Value {
    json!({
        "id": id,
        "ok": false,
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}

/// One line read from the request stream
#[derive(Debug, PartialEq, Eq)]
pub enum RequestLine {
    Text(String),
    TooLong,
    NotUtf8,
}

/// Read one line of at most `limit` bytes. The rest of an oversized line is
/// skipped in chunks, so memory stays bounded by `limit`. Returns `None` at
/// end of input.
pub async fn read_request_line<R>(reader: &mut R, limit: usize) -> std::io::Result<Option<RequestLine>>
where
    R: AsyncBufRead + Unpin,
{
    let chunk = limit as u64 + 1;
    let mut buf = Vec::new();
    if (&mut *reader).take(chunk).read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }

    if buf.last() != Some(&b'\n') && buf.len() > limit {
        let mut skipped = Vec::new();
        loop {
            skipped.clear();
            let read = (&mut *reader).take(chunk).read_until(b'\n', &mut skipped).await?;
            if read == 0 || skipped.last() == Some(&b'\n') {
                break;
            }
        }
        return Ok(Some(RequestLine::TooLong));
    }

    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(match String::from_utf8(buf) {
        Ok(line) => RequestLine::Text(line),
        Err(_) => RequestLine::NotUtf8,
    }))
}

/// Event pushed to the frontend outside of any request
pub fn event(name: &str, payload: impl Serialize) -> Value {
    json!({
        "event": name,
        "payload": payload,
    })
}

pub(crate) fn parse<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| AppError::Validation(format!("invalid params: {}", e)))
}

pub(crate) fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Application information structure
#[derive(Serialize)]
pub struct AppInfo {
    pub version: String,
    pub data_dir: String,
}

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_dir: state.data_dir.to_string_lossy().to_string(),
    }
}

async fn route(state: &AppState, method: &str, params: Value) -> Result<Value> {
    if method == "app.info" {
        return to_json(get_app_info(state));
    }

    match method.split_once('.') {
        Some((
            "periods" | "subjects" | "students" | "assessments" | "plans" | "materials",
            _,
        )) => {
            records::handle(state, method, params).await
        }
        Some(("grading", _)) => grading::handle(state, method, params).await,
        Some(("calendar", _)) => calendar::handle(state, method, params).await,
        Some(("settings", _)) => settings::handle(state, method, params).await,
        _ => Err(AppError::UnknownMethod(method.to_string())),
    }
}

/// Route one request and build its response. Never fails: every error
/// becomes an error response.
pub async fn handle_request(state: &AppState, req: Request) -> Value {
    tracing::debug!("Handling {} ({})", req.method, req.id);

    match route(state, &req.method, req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => {
            tracing::warn!("Request {} ({}) failed: {}", req.id, req.method, e);
            err(&req.id, e.code(), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_lines_until_end_of_input() {
        let mut input: &[u8] = b"{\"a\":1}\r\n\nlast";

        assert_eq!(
            read_request_line(&mut input, 64).await.unwrap(),
            Some(RequestLine::Text("{\"a\":1}".to_string()))
        );
        assert_eq!(
            read_request_line(&mut input, 64).await.unwrap(),
            Some(RequestLine::Text(String::new()))
        );
        assert_eq!(
            read_request_line(&mut input, 64).await.unwrap(),
            Some(RequestLine::Text("last".to_string()))
        );
        assert_eq!(read_request_line(&mut input, 64).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped() {
        let long = "x".repeat(40);
        let data = format!("{}\nnext\n", long);
        let mut input = data.as_bytes();

        assert_eq!(
            read_request_line(&mut input, 8).await.unwrap(),
            Some(RequestLine::TooLong)
        );
        assert_eq!(
            read_request_line(&mut input, 8).await.unwrap(),
            Some(RequestLine::Text("next".to_string()))
        );
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let mut input: &[u8] = b"12345678\n";

        assert_eq!(
            read_request_line(&mut input, 8).await.unwrap(),
            Some(RequestLine::Text("12345678".to_string()))
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_reported() {
        let mut input: &[u8] = b"\xff\xfe\n";

        assert_eq!(
            read_request_line(&mut input, 8).await.unwrap(),
            Some(RequestLine::NotUtf8)
        );
    }
}
