//! User-facing notifications
//!
//! Save results are reported through a `Notifier` so the front-end can show
//! them as toasts. The bridge forwards them over a channel; tests record them.

use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!("{}: {}", notification.title, notification.message)
            }
            NotificationKind::Error => {
                tracing::warn!("{}: {}", notification.title, notification.message)
            }
        }
    }
}

/// Forwards notifications to the bridge's event stream
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<Notification>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // Receiver dropped once the bridge stops reading
        if let Err(e) = self.tx.send(notification) {
            tracing::debug!("Notification channel closed, logging instead");
            TracingNotifier.notify(e.0);
        }
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut list) = self.received.lock() {
            list.push(notification);
        }
    }
}
