//! Periodic draft auto-save

use scribe_core::{EditorEvent, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::editor::EditorAdapter;
use crate::fields::FieldStore;
use crate::notifier::{Severity, StatusNotifier};
use crate::tracker::ChangeTracker;
use crate::transport::{SaveRequest, SaveTransport};
use crate::AutoSaveError;

/// Why a tick did not submit anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotDraft,
    NoChanges,
}

/// Result of one auto-save attempt
#[derive(Debug)]
pub enum SaveOutcome {
    Skipped(SkipReason),
    /// Accepted, and the unsaved flag was cleared
    Saved { sequence: u64 },
    /// Accepted, but a newer edit or request made it stale
    Superseded { sequence: u64 },
    Failed { sequence: u64, error: AutoSaveError },
}

impl SaveOutcome {
    pub fn submitted(&self) -> bool {
        !matches!(self, SaveOutcome::Skipped(_))
    }
}

/// Everything one auto-save attempt reads from and reports to
pub struct AutoSaver {
    session_id: Uuid,
    url: String,
    title_field: String,
    draft_field: String,
    fields: Arc<FieldStore>,
    editor: Arc<dyn EditorAdapter>,
    tracker: Arc<ChangeTracker>,
    notifier: Arc<StatusNotifier>,
    transport: Arc<dyn SaveTransport>,
    bus: Arc<dyn EventBus>,
    /// Held for a whole attempt so submissions never overlap
    in_flight: Mutex<()>,
}

/// Everything needed to construct an [`AutoSaver`]
pub struct AutoSaverParts {
    pub session_id: Uuid,
    pub url: String,
    pub title_field: String,
    pub draft_field: String,
    pub fields: Arc<FieldStore>,
    pub editor: Arc<dyn EditorAdapter>,
    pub tracker: Arc<ChangeTracker>,
    pub notifier: Arc<StatusNotifier>,
    pub transport: Arc<dyn SaveTransport>,
    pub bus: Arc<dyn EventBus>,
}

impl AutoSaver {
    pub fn new(parts: AutoSaverParts) -> Self {
        Self {
            session_id: parts.session_id,
            url: parts.url,
            title_field: parts.title_field,
            draft_field: parts.draft_field,
            fields: parts.fields,
            editor: parts.editor,
            tracker: parts.tracker,
            notifier: parts.notifier,
            transport: parts.transport,
            bus: parts.bus,
            in_flight: Mutex::new(()),
        }
    }

    /// Submit the current draft if it is a draft with unsaved changes
    ///
    /// A call made while another attempt is in flight waits for it to finish
    /// and then re-checks the conditions.
    pub async fn perform_auto_save(&self) -> SaveOutcome {
        let _in_flight = self.in_flight.lock().await;

        if !self.fields.flag(&self.draft_field).await {
            tracing::trace!("Skipping auto-save: not a draft");
            return SaveOutcome::Skipped(SkipReason::NotDraft);
        }
        if !self.tracker.has_unsaved_changes().await {
            tracing::trace!("Skipping auto-save: no changes");
            return SaveOutcome::Skipped(SkipReason::NoChanges);
        }

        // Ticket first: an edit racing the content read then makes it stale.
        let ticket = self.tracker.begin_submission().await;
        let sequence = ticket.sequence;

        let title = self
            .fields
            .value(&self.title_field)
            .await
            .unwrap_or_default();
        let request = SaveRequest::draft(title, self.editor.content().await);

        self.publish(EditorEvent::save_submitted(self.session_id, sequence))
            .await;
        tracing::debug!("Submitting auto-save #{} to {}", sequence, self.url);

        match self.transport.submit(&self.url, &request).await {
            Ok(()) => {
                let applied = self.tracker.complete_submission(ticket).await;
                self.publish(EditorEvent::save_completed(
                    self.session_id,
                    sequence,
                    applied,
                ))
                .await;

                if applied {
                    tracing::info!("Draft auto-saved (#{})", sequence);
                    SaveOutcome::Saved { sequence }
                } else {
                    SaveOutcome::Superseded { sequence }
                }
            }
            Err(error) => {
                tracing::warn!("Auto-save #{} failed: {}", sequence, error);
                self.notifier
                    .show(error.status_message(), Severity::Error)
                    .await;
                self.publish(EditorEvent::save_failed(
                    self.session_id,
                    sequence,
                    error.to_string(),
                ))
                .await;
                SaveOutcome::Failed { sequence, error }
            }
        }
    }

    async fn publish(&self, event: EditorEvent) {
        if let Err(e) = self.bus.publish(event).await {
            tracing::warn!("Failed to publish auto-save event: {}", e);
        }
    }

    /// Run [`perform_auto_save`](Self::perform_auto_save) every `period`
    ///
    /// The first tick comes one full period after start. Ticks are
    /// serialized: while a slow submission is in flight, due ticks are
    /// skipped rather than queued.
    pub fn start(self: Arc<Self>, period: Duration) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        tracing::info!(
            "Auto-save scheduler started: every {:?} to {}",
            period,
            self.url
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        self.perform_auto_save().await;
                    }
                }
            }

            tracing::debug!("Auto-save scheduler stopped");
        });

        SchedulerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running auto-save scheduler
///
/// Dropping the handle also stops the scheduler.
pub struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Stop ticking without waiting for an in-flight submission
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }

    /// Stop ticking and wait for an in-flight submission to finish
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Auto-save scheduler task ended abnormally: {}", e);
            }
        }
    }
}
