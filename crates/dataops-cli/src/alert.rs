use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::workspace::{AlertConfig, NotifierKind};

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A message for the operators of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub subject: String,
    pub body: String,
    pub recipient: String,
    pub sent_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(subject: impl Into<String>, body: impl Into<String>, recipient: &str) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipient: recipient.to_string(),
            sent_at: Utc::now(),
        }
    }
}

/// Delivery channel for alerts. The mail transport itself lives outside.
pub trait Notifier {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError>;
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError> {
        info!(
            event = "alert",
            subject = %alert.subject,
            recipient = %alert.recipient,
            body = %alert.body
        );
        Ok(())
    }
}

/// Appends one JSON line per alert.
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_vec(alert)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        info!(event = "alert_queued", subject = %alert.subject, path = %self.path.display());
        Ok(())
    }
}

pub fn notifier_for(config: &AlertConfig, log_dir: &std::path::Path) -> Box<dyn Notifier> {
    match config.notifier {
        NotifierKind::Log => Box::new(LogNotifier),
        NotifierKind::Outbox => Box::new(OutboxNotifier::new(log_dir.join("alerts.ndjson"))),
    }
}
