// ClassDesk - data core for the school administration desktop app
// Entry point: JSON-lines bridge between the frontend and the services

use anyhow::Context;
use classdesk::commands::{self, Request, RequestLine};
use classdesk::config::{DATA_DIR_ENV, DEFAULT_LOG_FILTER, MAX_REQUEST_LINE_BYTES};
use classdesk::services::{ChannelNotifier, SettingsService};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader, Stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Data directory from the first argument, then the environment
fn data_dir() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("classdesk-data"))
}

async fn write_line(stdout: &mut Stdout, value: &Value) -> std::io::Result<()> {
    let mut line = value.to_string();
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = data_dir();

    let settings = SettingsService::new(data_dir.clone())
        .load()
        .await
        .context("failed to load settings")?;
    let log_filter = settings
        .logging
        .filter
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting ClassDesk {}", env!("CARGO_PKG_VERSION"));

    let (tx, mut notifications) = tokio::sync::mpsc::unbounded_channel();
    let state = classdesk::app::setup(data_dir, Arc::new(ChannelNotifier::new(tx)))
        .await
        .context("failed to initialize application")?;

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    while let Some(line) = commands::read_request_line(&mut stdin, MAX_REQUEST_LINE_BYTES).await? {
        // Can't echo an id we failed to parse
        let response = match line {
            RequestLine::Text(line) if line.trim().is_empty() => continue,
            RequestLine::Text(line) => match serde_json::from_str::<Request>(&line) {
                Ok(req) => commands::handle_request(&state, req).await,
                Err(e) => commands::err("", "bad_json", e.to_string()),
            },
            RequestLine::TooLong => {
                tracing::warn!("Rejected request line over {} bytes", MAX_REQUEST_LINE_BYTES);
                commands::err("", "too_large", "request line exceeds the size limit")
            }
            RequestLine::NotUtf8 => commands::err("", "bad_json", "request line is not valid UTF-8"),
        };

        write_line(&mut stdout, &response).await?;

        while let Ok(notification) = notifications.try_recv() {
            write_line(&mut stdout, &commands::event("notification", notification)).await?;
        }
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}
