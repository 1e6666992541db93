//! Editor adapters: the value accessors and change events of an editing widget

use async_trait::async_trait;
use scribe_core::{EditorEvent, EventBus, Result, WidgetKind};
use std::sync::Arc;
use uuid::Uuid;

use crate::fields::FieldStore;
use crate::AutoSaveError;

/// What the auto-saver needs from an editing widget
#[async_trait]
pub trait EditorAdapter: Send + Sync {
    /// Which widget this adapter wraps
    fn kind(&self) -> WidgetKind;

    /// Current editor value
    async fn content(&self) -> String;

    /// Replace the value programmatically; not counted as a user edit
    async fn set_content(&self, content: String) -> Result<()>;

    /// Apply a user edit and announce it to subscribers
    async fn apply_edit(&self, content: String) -> Result<()>;
}

/// Editor whose value lives in the bound content field
///
/// Keeping the value in the field is what keeps a surrounding form (and
/// the fullscreen view) in sync with the editor.
pub struct BufferEditor {
    session_id: Uuid,
    kind: WidgetKind,
    content_field: String,
    fields: Arc<FieldStore>,
    bus: Arc<dyn EventBus>,
}

impl BufferEditor {
    /// Bind an editor to `content_field`, which must already exist
    pub async fn bind(
        session_id: Uuid,
        kind: WidgetKind,
        content_field: impl Into<String>,
        fields: Arc<FieldStore>,
        bus: Arc<dyn EventBus>,
    ) -> std::result::Result<Self, AutoSaveError> {
        let content_field = content_field.into();
        if !fields.contains(&content_field).await {
            return Err(AutoSaveError::MissingField(content_field));
        }

        Ok(Self {
            session_id,
            kind,
            content_field,
            fields,
            bus,
        })
    }
}

#[async_trait]
impl EditorAdapter for BufferEditor {
    fn kind(&self) -> WidgetKind {
        self.kind
    }

    async fn content(&self) -> String {
        self.fields
            .value(&self.content_field)
            .await
            .unwrap_or_default()
    }

    async fn set_content(&self, content: String) -> Result<()> {
        self.fields.set(self.content_field.as_str(), content).await;
        self.bus
            .publish(EditorEvent::content_loaded(self.session_id))
            .await
    }

    async fn apply_edit(&self, content: String) -> Result<()> {
        if self.content().await == content {
            return Ok(());
        }

        self.fields.set(self.content_field.as_str(), content).await;
        self.bus
            .publish(EditorEvent::content_changed(self.session_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::{EventHandler, InMemoryEventBus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        changed: AtomicUsize,
        loaded: AtomicUsize,
    }

    #[async_trait]
    impl EventHandler for Counter {
        async fn handle_event(&self, event: &EditorEvent) -> Result<()> {
            match event {
                EditorEvent::ContentChanged { .. } => {
                    self.changed.fetch_add(1, Ordering::SeqCst);
                }
                EditorEvent::ContentLoaded { .. } => {
                    self.loaded.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_bind_requires_content_field() {
        let fields = Arc::new(FieldStore::new());
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());

        let result =
            BufferEditor::bind(Uuid::new_v4(), WidgetKind::TinyMde, "txt_content", fields, bus)
                .await;
        assert!(matches!(result, Err(AutoSaveError::MissingField(f)) if f == "txt_content"));
    }

    #[tokio::test]
    async fn test_edits_and_loads_publish_distinct_events() {
        let fields = Arc::new(FieldStore::with_fields([("txt_content", "draft")]));
        let bus = Arc::new(InMemoryEventBus::new());
        let counter = Arc::new(Counter::default());
        bus.subscribe(counter.clone(), None).await.unwrap();

        let editor = BufferEditor::bind(
            Uuid::new_v4(),
            WidgetKind::EasyMde,
            "txt_content",
            fields.clone(),
            bus,
        )
        .await
        .unwrap();

        editor.apply_edit("draft, edited".to_string()).await.unwrap();
        editor.apply_edit("draft, edited".to_string()).await.unwrap();
        editor.set_content("reloaded".to_string()).await.unwrap();

        assert_eq!(counter.changed.load(Ordering::SeqCst), 1);
        assert_eq!(counter.loaded.load(Ordering::SeqCst), 1);
        assert_eq!(fields.value("txt_content").await.as_deref(), Some("reloaded"));
        assert_eq!(editor.content().await, "reloaded");
    }
}
