//! Draft auto-save for Markdown editing sessions
//!
//! An [`EditorSession`] binds an editor widget to a set of form fields,
//! tracks unsaved changes, periodically posts drafts to a remote endpoint
//! and reports progress through short-lived status notifications.

use scribe_core::ScribeError;
use thiserror::Error;

pub mod editor;
pub mod fields;
pub mod notifier;
pub mod presentation;
pub mod scheduler;
pub mod session;
pub mod tracker;
pub mod transport;

pub use editor::{BufferEditor, EditorAdapter};
pub use fields::FieldStore;
pub use notifier::{
    RecordingSink, Severity, SinkCall, StatusNotification, StatusNotifier, StatusSink,
    TracingSink, NOTIFICATION_DISPLAY,
};
pub use presentation::{Key, Page, PageSnapshot, PageStyle, PresentationMode, EXIT_REGION};
pub use scheduler::{AutoSaver, AutoSaverParts, SaveOutcome, SchedulerHandle, SkipReason};
pub use session::{EditorSession, EditorSessionBuilder};
pub use tracker::{ChangeTracker, SubmissionTicket, PENDING_MESSAGE, SAVED_MESSAGE};
pub use transport::{HttpTransport, MemoryTransport, Reply, SaveRequest, SaveTransport};

/// Failures of the auto-save pipeline
#[derive(Error, Debug)]
pub enum AutoSaveError {
    #[error("Server rejected auto-save with HTTP {status}")]
    Rejected { status: u16 },

    #[error("Auto-save request failed: {0}")]
    Connection(String),

    #[error("Content field '{0}' not found")]
    MissingField(String),
}

impl AutoSaveError {
    /// Text shown to the user in the error notification
    pub fn status_message(&self) -> &'static str {
        match self {
            AutoSaveError::Rejected { .. } => "Auto-save failed",
            AutoSaveError::Connection(_) => "Connection error during auto-save",
            AutoSaveError::MissingField(_) => "Editor is not bound to a content field",
        }
    }
}

impl From<AutoSaveError> for ScribeError {
    fn from(err: AutoSaveError) -> Self {
        match err {
            AutoSaveError::Rejected { .. } | AutoSaveError::Connection(_) => {
                ScribeError::transport(err.to_string())
            }
            AutoSaveError::MissingField(_) => ScribeError::session(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::ErrorSeverity;

    #[test]
    fn test_status_messages() {
        assert_eq!(
            AutoSaveError::Rejected { status: 500 }.status_message(),
            "Auto-save failed"
        );
        assert_eq!(
            AutoSaveError::Connection("refused".into()).status_message(),
            "Connection error during auto-save"
        );
    }

    #[test]
    fn test_conversion_into_core_error() {
        let err: ScribeError = AutoSaveError::Rejected { status: 503 }.into();
        assert!(matches!(err, ScribeError::Transport(_)));
        assert!(err.is_recoverable());

        let err: ScribeError = AutoSaveError::MissingField("txt_content".into()).into();
        assert!(matches!(err, ScribeError::Session(_)));
        assert!(err.to_string().contains("txt_content"));
        assert_ne!(err.severity(), ErrorSeverity::Low);
    }
}
