//! Event system for decoupled communication between editor components
//!
//! Editor adapters publish [`EditorEvent`]s; change trackers and loggers
//! subscribe with an explicit [`SubscriptionId`] and unsubscribe on teardown.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, ScribeError};

/// Event serialization utilities for logging and debugging
pub mod serialization {
    use super::*;

    /// Serialize an event to JSON string
    pub fn serialize_event(event: &EditorEvent) -> Result<String> {
        serde_json::to_string(event).map_err(ScribeError::Json)
    }

    /// Deserialize an event from JSON string
    pub fn deserialize_event(json: &str) -> Result<EditorEvent> {
        serde_json::from_str(json).map_err(ScribeError::Json)
    }

    /// Format event for logging with timestamp
    pub fn format_event_for_log(event: &EditorEvent) -> String {
        let timestamp = event
            .timestamp()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        format!(
            "[{}] {}: {}",
            timestamp,
            event.event_type().to_uppercase(),
            event.description()
        )
    }
}

/// Event bus for publishing and subscribing to editor events
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to all matching subscribers
    async fn publish(&self, event: EditorEvent) -> Result<()>;

    /// Subscribe to events with optional filtering
    async fn subscribe(
        &self,
        handler: Arc<dyn EventHandler>,
        filter: Option<Box<dyn EventFilter>>,
    ) -> Result<SubscriptionId>;

    /// Unsubscribe from events
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;

    /// Get the number of active subscriptions
    async fn subscription_count(&self) -> usize;
}

/// Handler for editor events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an incoming event
    async fn handle_event(&self, event: &EditorEvent) -> Result<()>;

    /// Get handler name for debugging
    fn handler_name(&self) -> &str {
        "UnnamedHandler"
    }
}

/// Filter for events to determine if they should be delivered to a handler
pub trait EventFilter: Send + Sync {
    /// Check if the event should be delivered to the handler
    fn should_handle(&self, event: &EditorEvent) -> bool;

    /// Get filter name for debugging
    fn filter_name(&self) -> &str {
        "UnnamedFilter"
    }
}

/// Delivers only the events of one editing session
#[derive(Debug, Clone, Copy)]
pub struct SessionFilter {
    session_id: Uuid,
}

impl SessionFilter {
    pub fn new(session_id: Uuid) -> Self {
        Self { session_id }
    }
}

impl EventFilter for SessionFilter {
    fn should_handle(&self, event: &EditorEvent) -> bool {
        event.session_id() == self.session_id
    }

    fn filter_name(&self) -> &str {
        "SessionFilter"
    }
}

/// Unique identifier for event subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Events emitted over the lifetime of an editing session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EditorEvent {
    /// The user mutated the editor content
    ContentChanged {
        session_id: Uuid,
        timestamp: SystemTime,
    },
    /// Content was replaced programmatically (load, restore)
    ContentLoaded {
        session_id: Uuid,
        timestamp: SystemTime,
    },
    /// An auto-save request left for the endpoint
    SaveSubmitted {
        session_id: Uuid,
        sequence: u64,
        timestamp: SystemTime,
    },
    /// The endpoint accepted an auto-save request
    SaveCompleted {
        session_id: Uuid,
        sequence: u64,
        /// False when a newer edit or request superseded this one
        applied: bool,
        timestamp: SystemTime,
    },
    /// An auto-save request was rejected or never reached the endpoint
    SaveFailed {
        session_id: Uuid,
        sequence: u64,
        message: String,
        timestamp: SystemTime,
    },
    /// Fullscreen mode was entered or left
    PresentationChanged {
        session_id: Uuid,
        fullscreen: bool,
        timestamp: SystemTime,
    },
    /// The session was torn down
    SessionClosed {
        session_id: Uuid,
        timestamp: SystemTime,
    },
}

impl EditorEvent {
    pub fn content_changed(session_id: Uuid) -> Self {
        Self::ContentChanged {
            session_id,
            timestamp: SystemTime::now(),
        }
    }

    pub fn content_loaded(session_id: Uuid) -> Self {
        Self::ContentLoaded {
            session_id,
            timestamp: SystemTime::now(),
        }
    }

    pub fn save_submitted(session_id: Uuid, sequence: u64) -> Self {
        Self::SaveSubmitted {
            session_id,
            sequence,
            timestamp: SystemTime::now(),
        }
    }

    pub fn save_completed(session_id: Uuid, sequence: u64, applied: bool) -> Self {
        Self::SaveCompleted {
            session_id,
            sequence,
            applied,
            timestamp: SystemTime::now(),
        }
    }

    pub fn save_failed(session_id: Uuid, sequence: u64, message: String) -> Self {
        Self::SaveFailed {
            session_id,
            sequence,
            message,
            timestamp: SystemTime::now(),
        }
    }

    pub fn presentation_changed(session_id: Uuid, fullscreen: bool) -> Self {
        Self::PresentationChanged {
            session_id,
            fullscreen,
            timestamp: SystemTime::now(),
        }
    }

    pub fn session_closed(session_id: Uuid) -> Self {
        Self::SessionClosed {
            session_id,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the event type identifier
    pub fn event_type(&self) -> &str {
        match self {
            EditorEvent::ContentChanged { .. } => "content_changed",
            EditorEvent::ContentLoaded { .. } => "content_loaded",
            EditorEvent::SaveSubmitted { .. } => "save_submitted",
            EditorEvent::SaveCompleted { .. } => "save_completed",
            EditorEvent::SaveFailed { .. } => "save_failed",
            EditorEvent::PresentationChanged { .. } => "presentation_changed",
            EditorEvent::SessionClosed { .. } => "session_closed",
        }
    }

    /// Get the session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            EditorEvent::ContentChanged { session_id, .. }
            | EditorEvent::ContentLoaded { session_id, .. }
            | EditorEvent::SaveSubmitted { session_id, .. }
            | EditorEvent::SaveCompleted { session_id, .. }
            | EditorEvent::SaveFailed { session_id, .. }
            | EditorEvent::PresentationChanged { session_id, .. }
            | EditorEvent::SessionClosed { session_id, .. } => *session_id,
        }
    }

    /// Get the event timestamp
    pub fn timestamp(&self) -> SystemTime {
        match self {
            EditorEvent::ContentChanged { timestamp, .. }
            | EditorEvent::ContentLoaded { timestamp, .. }
            | EditorEvent::SaveSubmitted { timestamp, .. }
            | EditorEvent::SaveCompleted { timestamp, .. }
            | EditorEvent::SaveFailed { timestamp, .. }
            | EditorEvent::PresentationChanged { timestamp, .. }
            | EditorEvent::SessionClosed { timestamp, .. } => *timestamp,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            EditorEvent::ContentChanged { session_id, .. } => {
                format!("Content of session {} changed", session_id)
            }
            EditorEvent::ContentLoaded { session_id, .. } => {
                format!("Content of session {} loaded", session_id)
            }
            EditorEvent::SaveSubmitted {
                session_id,
                sequence,
                ..
            } => format!("Auto-save #{} submitted for session {}", sequence, session_id),
            EditorEvent::SaveCompleted {
                session_id,
                sequence,
                applied,
                ..
            } => {
                if *applied {
                    format!("Auto-save #{} completed for session {}", sequence, session_id)
                } else {
                    format!(
                        "Auto-save #{} completed for session {} but was superseded",
                        sequence, session_id
                    )
                }
            }
            EditorEvent::SaveFailed {
                session_id,
                sequence,
                message,
                ..
            } => format!(
                "Auto-save #{} failed for session {}: {}",
                sequence, session_id, message
            ),
            EditorEvent::PresentationChanged {
                session_id,
                fullscreen,
                ..
            } => {
                let mode = if *fullscreen { "fullscreen" } else { "normal" };
                format!("Session {} switched to {} mode", session_id, mode)
            }
            EditorEvent::SessionClosed { session_id, .. } => {
                format!("Session {} closed", session_id)
            }
        }
    }

    /// Check if this is an auto-save lifecycle event
    pub fn is_save_event(&self) -> bool {
        matches!(
            self,
            EditorEvent::SaveSubmitted { .. }
                | EditorEvent::SaveCompleted { .. }
                | EditorEvent::SaveFailed { .. }
        )
    }
}

/// Subscription information stored in the event bus
struct Subscription {
    handler: Arc<dyn EventHandler>,
    filter: Option<Box<dyn EventFilter>>,
}

/// In-memory implementation of the event bus
pub struct InMemoryEventBus {
    subscriptions: RwLock<HashMap<SubscriptionId, Arc<Subscription>>>,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: EditorEvent) -> Result<()> {
        tracing::trace!("Publishing event: {}", event.event_type());

        // Handlers run without the lock held so they may (un)subscribe.
        let subscriptions: Vec<Arc<Subscription>> =
            self.subscriptions.read().await.values().cloned().collect();

        if subscriptions.is_empty() {
            tracing::trace!("No subscribers for event type: {}", event.event_type());
            return Ok(());
        }

        let mut handlers_called = 0;
        for subscription in subscriptions {
            let should_handle = subscription
                .filter
                .as_ref()
                .map(|filter| filter.should_handle(&event))
                .unwrap_or(true);

            if !should_handle {
                continue;
            }

            if let Err(e) = subscription.handler.handle_event(&event).await {
                tracing::error!(
                    "Handler {} failed to process event {}: {}",
                    subscription.handler.handler_name(),
                    event.event_type(),
                    e
                );
            } else {
                handlers_called += 1;
            }
        }

        tracing::trace!(
            "Routed event {} to {} handlers",
            event.event_type(),
            handlers_called
        );

        Ok(())
    }

    async fn subscribe(
        &self,
        handler: Arc<dyn EventHandler>,
        filter: Option<Box<dyn EventFilter>>,
    ) -> Result<SubscriptionId> {
        let id = SubscriptionId::new();
        let name = handler.handler_name().to_string();

        self.subscriptions
            .write()
            .await
            .insert(id, Arc::new(Subscription { handler, filter }));

        tracing::debug!("Created subscription {:?} for handler {}", id, name);
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        if self.subscriptions.write().await.remove(&id).is_some() {
            tracing::debug!("Removed subscription: {:?}", id);
            Ok(())
        } else {
            Err(ScribeError::event_bus(format!(
                "Subscription {:?} does not exist",
                id
            )))
        }
    }

    async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}
