//! Unsaved-change tracking with sequence-checked save completion

use async_trait::async_trait;
use scribe_core::{EditorEvent, EventHandler, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{Severity, StatusNotifier};

pub const PENDING_MESSAGE: &str = "Unsaved changes";
pub const SAVED_MESSAGE: &str = "Changes saved automatically";

#[derive(Debug, Default)]
struct TrackerState {
    has_unsaved_changes: bool,
    /// Advanced by every edit and every reload
    edit_count: u64,
    /// Sequence number of the most recently issued submission
    last_issued: u64,
}

/// Proof that a submission was issued, handed back on completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket {
    pub sequence: u64,
    edit_count: u64,
}

/// Owns the "has unsaved changes" flag of one session
pub struct ChangeTracker {
    state: RwLock<TrackerState>,
    notifier: Arc<StatusNotifier>,
}

impl ChangeTracker {
    pub fn new(notifier: Arc<StatusNotifier>) -> Self {
        Self {
            state: RwLock::new(TrackerState::default()),
            notifier,
        }
    }

    pub async fn has_unsaved_changes(&self) -> bool {
        self.state.read().await.has_unsaved_changes
    }

    /// Record a content mutation
    ///
    /// Only the first edit after a save or load shows the pending notice.
    pub async fn on_content_changed(&self) {
        let became_dirty = {
            let mut state = self.state.write().await;
            state.edit_count += 1;
            let was_dirty = state.has_unsaved_changes;
            state.has_unsaved_changes = true;
            !was_dirty
        };

        if became_dirty {
            tracing::debug!("Content has unsaved changes");
            self.notifier.show(PENDING_MESSAGE, Severity::Pending).await;
        }
    }

    /// Clear the flag after a confirmed remote write
    pub async fn mark_saved(&self) {
        self.state.write().await.has_unsaved_changes = false;
        self.notifier.show(SAVED_MESSAGE, Severity::Saved).await;
    }

    /// Clear the flag silently after content was (re)loaded
    ///
    /// Submissions issued before the reload can no longer complete.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.edit_count += 1;
        state.has_unsaved_changes = false;
    }

    /// Issue the next submission sequence number
    pub async fn begin_submission(&self) -> SubmissionTicket {
        let mut state = self.state.write().await;
        state.last_issued += 1;
        SubmissionTicket {
            sequence: state.last_issued,
            edit_count: state.edit_count,
        }
    }

    /// Apply a successful submission
    ///
    /// Returns false, leaving the flag untouched, when a newer submission
    /// was issued or the content changed after `ticket` was taken.
    pub async fn complete_submission(&self, ticket: SubmissionTicket) -> bool {
        {
            let mut state = self.state.write().await;
            if ticket.sequence != state.last_issued || ticket.edit_count != state.edit_count {
                tracing::debug!(
                    "Ignoring stale auto-save #{} (latest #{}, edits {} -> {})",
                    ticket.sequence,
                    state.last_issued,
                    ticket.edit_count,
                    state.edit_count
                );
                return false;
            }
            state.has_unsaved_changes = false;
        }

        self.notifier.show(SAVED_MESSAGE, Severity::Saved).await;
        true
    }
}

#[async_trait]
impl EventHandler for ChangeTracker {
    async fn handle_event(&self, event: &EditorEvent) -> Result<()> {
        match event {
            EditorEvent::ContentChanged { .. } => self.on_content_changed().await,
            EditorEvent::ContentLoaded { .. } => self.reset().await,
            _ => {}
        }
        Ok(())
    }

    fn handler_name(&self) -> &str {
        "ChangeTracker"
    }
}
