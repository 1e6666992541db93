//! Walk through one draft-editing session against an in-memory endpoint
//!
//! The first submission is rejected, the next tick retries it, and every
//! event published by the session is printed as it happens.

use async_trait::async_trait;
use scribe_autosave::{EditorSession, FieldStore, MemoryTransport, Reply};
use scribe_core::event::serialization::format_event_for_log;
use scribe_core::{EditorConfig, EditorEvent, EventBus, EventHandler, InMemoryEventBus};
use std::sync::Arc;
use std::time::Duration;

struct EventPrinter;

#[async_trait]
impl EventHandler for EventPrinter {
    async fn handle_event(&self, event: &EditorEvent) -> scribe_core::Result<()> {
        println!("  {}", format_event_for_log(event));
        Ok(())
    }

    fn handler_name(&self) -> &str {
        "EventPrinter"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Auto-save Demo ===\n");

    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    bus.subscribe(Arc::new(EventPrinter), None).await?;

    let transport = Arc::new(MemoryTransport::with_replies([Reply::Reject(503)]));
    let fields = Arc::new(FieldStore::with_fields([
        ("txt_content", "# Release notes"),
        ("title", "Release notes"),
        ("draft", "true"),
    ]));
    let config = EditorConfig {
        auto_save_url: Some("http://localhost:8080/admin/post/1/autosave".to_string()),
        auto_save_interval_ms: 300,
        ..EditorConfig::default()
    };

    let session = EditorSession::builder(config, fields)
        .bus(bus.clone())
        .transport(transport.clone())
        .build()
        .await?;

    println!("Editing...");
    session
        .apply_edit("# Release notes\n\n- Faster startup".to_string())
        .await?;

    println!("Waiting for two ticks...");
    tokio::time::sleep(Duration::from_millis(700)).await;

    println!("\nToggling fullscreen...");
    session.handle_key("F11").await?;
    println!("  page: {:?}", session.page().await.regions);
    session.handle_key("Escape").await?;

    println!("\nRequests sent: {}", transport.request_count());
    println!("Unsaved changes: {}", session.has_unsaved_changes().await);

    session.teardown().await?;
    println!("\n✓ Session closed");
    Ok(())
}
