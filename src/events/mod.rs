use crate::state::{CompressionReport, FailureReason};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum AppEvent {
    // Source selection
    SourceSelected(PathBuf),
    SourceRejected(PathBuf),

    // Compression events
    CompressionStarted {
        job_id: Uuid,
        source: PathBuf,
        output: PathBuf,
    },
    CompressionSucceeded(CompressionReport),
    CompressionFailed {
        job_id: Uuid,
        reason: FailureReason,
    },

    // Settings events
    PresetApplied(String),
    SettingsChanged,
    ConfigLoaded,
    ConfigSaved,

    // Error events
    ErrorOccurred(String),
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Sends without failing when the receiving side is gone.
pub fn publish(sender: &EventSender, event: AppEvent) {
    if let Err(e) = sender.send(event) {
        tracing::error!("Failed to send event: {}", e);
    }
}
