//! Transient status notifications ("Unsaved changes", "Changes saved automatically")

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

/// How long a notification stays visible after it is shown
pub const NOTIFICATION_DISPLAY: Duration = Duration::from_millis(3000);

/// Kind of save state a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Content differs from the last saved draft
    Pending,
    /// A draft was saved
    Saved,
    /// An auto-save attempt failed
    Error,
}

impl Severity {
    /// Indicator background used by the browser widgets
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Pending => "#ffc107",
            Severity::Saved => "#28a745",
            Severity::Error => "#dc3545",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Pending => write!(f, "pending"),
            Severity::Saved => write!(f, "saved"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A message on the status indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotification {
    pub text: String,
    pub severity: Severity,
    pub visible_until: Instant,
}

/// Where notifications are drawn
pub trait StatusSink: Send + Sync {
    /// Draw `notification` on the indicator, replacing whatever was there
    fn render(&self, indicator_id: &str, notification: &StatusNotification);

    /// Clear the indicator
    fn hide(&self, indicator_id: &str);
}

/// Sink that reports notifications through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn render(&self, indicator_id: &str, notification: &StatusNotification) {
        match notification.severity {
            Severity::Error => tracing::warn!(
                indicator = indicator_id,
                "{}",
                notification.text
            ),
            _ => tracing::info!(
                indicator = indicator_id,
                severity = %notification.severity,
                "{}",
                notification.text
            ),
        }
    }

    fn hide(&self, indicator_id: &str) {
        tracing::debug!(indicator = indicator_id, "status cleared");
    }
}

/// A call received by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Render { text: String, severity: Severity },
    Hide,
}

/// Sink that keeps every call in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of rendered notifications with the given severity
    pub fn rendered(&self, severity: Severity) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SinkCall::Render { severity: s, .. } if *s == severity))
            .count()
    }

    pub fn hides(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SinkCall::Hide))
            .count()
    }

    fn push(&self, call: SinkCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }
}

impl StatusSink for RecordingSink {
    fn render(&self, _indicator_id: &str, notification: &StatusNotification) {
        self.push(SinkCall::Render {
            text: notification.text.clone(),
            severity: notification.severity,
        });
    }

    fn hide(&self, _indicator_id: &str) {
        self.push(SinkCall::Hide);
    }
}

#[derive(Debug, Default)]
struct NotifierState {
    generation: u64,
    current: Option<StatusNotification>,
}

/// Shows one notification at a time and hides it after [`NOTIFICATION_DISPLAY`]
///
/// Each `show` call owns its hide timer. A timer whose notification has been
/// replaced does nothing, so the newest notification always gets its full
/// display window.
pub struct StatusNotifier {
    indicator_id: String,
    display_for: Duration,
    sink: Arc<dyn StatusSink>,
    state: Arc<AsyncMutex<NotifierState>>,
}

impl StatusNotifier {
    pub fn new(indicator_id: impl Into<String>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            indicator_id: indicator_id.into(),
            display_for: NOTIFICATION_DISPLAY,
            sink,
            state: Arc::new(AsyncMutex::new(NotifierState::default())),
        }
    }

    pub fn indicator_id(&self) -> &str {
        &self.indicator_id
    }

    /// Replace the current notification and schedule its hide
    pub async fn show(&self, text: impl Into<String>, severity: Severity) {
        let notification = StatusNotification {
            text: text.into(),
            severity,
            visible_until: Instant::now() + self.display_for,
        };

        let generation = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.current = Some(notification.clone());
            state.generation
        };

        self.sink.render(&self.indicator_id, &notification);

        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        let indicator_id = self.indicator_id.clone();
        let deadline = notification.visible_until;

        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let mut state = state.lock().await;
            if state.generation != generation {
                return;
            }
            state.current = None;
            drop(state);

            sink.hide(&indicator_id);
        });
    }

    /// The notification on screen right now, if any
    pub async fn current(&self) -> Option<StatusNotification> {
        let now = Instant::now();
        self.state
            .lock()
            .await
            .current
            .clone()
            .filter(|notification| notification.visible_until > now)
    }
}
