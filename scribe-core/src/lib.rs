//! Scribe Core - shared foundations for the Scribe draft auto-saver
//!
//! This crate provides the error type, configuration model and event bus
//! used by the auto-save machinery and the CLI host.

pub mod config;
pub mod error;
pub mod event;


// Re-export commonly used types
pub use config::{Config, EditorConfig, LoggingConfig, WidgetKind};
pub use error::{ErrorSeverity, Result, ScribeError};
pub use event::{
    EditorEvent, EventBus, EventFilter, EventHandler, InMemoryEventBus, SessionFilter,
    SubscriptionId,
};
