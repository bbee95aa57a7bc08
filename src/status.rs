//! User-facing status messages.
//!
//! All user-visible outcomes (load results, search progress, failures) are
//! reported through one channel carrying a severity and an optional
//! auto-dismiss duration.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
    Loading,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
    /// `None` keeps the message until the next one replaces it
    pub dismiss_after: Option<Duration>,
    pub issued_at: DateTime<Utc>,
}

/// Sending half of the status channel
#[derive(Clone)]
pub struct StatusSender {
    tx: UnboundedSender<StatusMessage>,
}

pub fn status_channel() -> (StatusSender, UnboundedReceiver<StatusMessage>) {
    let (tx, rx) = unbounded_channel();
    (StatusSender { tx }, rx)
}

impl StatusSender {
    pub fn send(&self, severity: Severity, text: impl Into<String>, dismiss_after_ms: u64) {
        let text = text.into();
        debug!(?severity, "status: {}", text);

        let message = StatusMessage {
            severity,
            text,
            dismiss_after: (dismiss_after_ms > 0).then(|| Duration::from_millis(dismiss_after_ms)),
            issued_at: Utc::now(),
        };
        // A dropped receiver only means nobody is displaying status
        let _ = self.tx.send(message);
    }

    pub fn info(&self, text: impl Into<String>, dismiss_after_ms: u64) {
        self.send(Severity::Info, text, dismiss_after_ms);
    }

    pub fn success(&self, text: impl Into<String>, dismiss_after_ms: u64) {
        self.send(Severity::Success, text, dismiss_after_ms);
    }

    pub fn error(&self, text: impl Into<String>, dismiss_after_ms: u64) {
        self.send(Severity::Error, text, dismiss_after_ms);
    }

    pub fn loading(&self, text: impl Into<String>) {
        self.send(Severity::Loading, text, 0);
    }
}
