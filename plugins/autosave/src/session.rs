//! Editing session: one editor bound to its form fields, tracker and auto-saver

use scribe_core::{
    EditorConfig, EditorEvent, EventBus, InMemoryEventBus, Result, SessionFilter,
    SubscriptionId, WidgetKind,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::editor::{BufferEditor, EditorAdapter};
use crate::fields::FieldStore;
use crate::notifier::{StatusNotification, StatusNotifier, StatusSink, TracingSink};
use crate::presentation::{Key, Page, PresentationMode};
use crate::scheduler::{AutoSaver, AutoSaverParts, SaveOutcome, SchedulerHandle};
use crate::tracker::ChangeTracker;
use crate::transport::{HttpTransport, SaveTransport};

struct View {
    mode: PresentationMode,
    page: Page,
}

/// Builder for [`EditorSession`]
///
/// Everything but the configuration and the fields has a default: a private
/// in-memory event bus, an HTTP transport and a tracing-backed status sink.
pub struct EditorSessionBuilder {
    config: EditorConfig,
    fields: Arc<FieldStore>,
    bus: Option<Arc<dyn EventBus>>,
    transport: Option<Arc<dyn SaveTransport>>,
    sink: Option<Arc<dyn StatusSink>>,
    page: Option<Page>,
}

impl EditorSessionBuilder {
    pub fn bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn SaveTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Page layout restored when leaving fullscreen
    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// Bind the editor and start auto-saving if a URL is configured
    pub async fn build(self) -> Result<EditorSession> {
        self.config.validate()?;

        let id = Uuid::new_v4();
        let config = self.config;
        let fields = self.fields;
        let bus = self
            .bus
            .unwrap_or_else(|| Arc::new(InMemoryEventBus::new()) as Arc<dyn EventBus>);
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn StatusSink>);

        let editor = Arc::new(
            BufferEditor::bind(
                id,
                config.widget,
                config.content_field.as_str(),
                fields.clone(),
                bus.clone(),
            )
            .await?,
        );

        let notifier = Arc::new(StatusNotifier::new(config.widget.indicator_id(), sink));
        let tracker = Arc::new(ChangeTracker::new(notifier.clone()));
        let subscription = bus
            .subscribe(tracker.clone(), Some(Box::new(SessionFilter::new(id))))
            .await?;

        let page = match self.page {
            Some(page) => page,
            None => default_page(&config, &fields).await,
        };

        let (saver, scheduler) = match config.auto_save_url.clone() {
            Some(url) => {
                let transport: Arc<dyn SaveTransport> = match self.transport {
                    Some(transport) => transport,
                    None => Arc::new(HttpTransport::new(config.request_timeout())?),
                };
                let saver = Arc::new(AutoSaver::new(AutoSaverParts {
                    session_id: id,
                    url,
                    title_field: config.title_field.clone(),
                    draft_field: config.draft_field.clone(),
                    fields: fields.clone(),
                    editor: editor.clone(),
                    tracker: tracker.clone(),
                    notifier: notifier.clone(),
                    transport,
                    bus: bus.clone(),
                }));
                let handle = saver.clone().start(config.auto_save_interval());
                (Some(saver), Some(handle))
            }
            None => {
                tracing::debug!("No auto-save URL configured; auto-save disabled");
                (None, None)
            }
        };

        let original_content = editor.content().await;
        tracing::info!("Editing session {} started ({})", id, config.widget);

        Ok(EditorSession {
            id,
            view: RwLock::new(View {
                mode: PresentationMode::new(
                    config.title_field.as_str(),
                    config.content_field.as_str(),
                ),
                page,
            }),
            config,
            fields,
            bus,
            editor,
            tracker,
            notifier,
            saver,
            scheduler,
            subscription,
            original_content: RwLock::new(original_content),
        })
    }
}

async fn default_page(config: &EditorConfig, fields: &FieldStore) -> Page {
    let mut regions = Vec::new();
    if fields.contains(&config.title_field).await {
        regions.push(config.title_field.clone());
    }
    regions.push(config.content_field.clone());
    regions.push(config.widget.indicator_id().to_string());
    Page::new(regions)
}

/// One editing instance
pub struct EditorSession {
    id: Uuid,
    config: EditorConfig,
    fields: Arc<FieldStore>,
    bus: Arc<dyn EventBus>,
    editor: Arc<BufferEditor>,
    tracker: Arc<ChangeTracker>,
    notifier: Arc<StatusNotifier>,
    saver: Option<Arc<AutoSaver>>,
    scheduler: Option<SchedulerHandle>,
    subscription: SubscriptionId,
    view: RwLock<View>,
    original_content: RwLock<String>,
}

impl EditorSession {
    pub fn builder(config: EditorConfig, fields: Arc<FieldStore>) -> EditorSessionBuilder {
        EditorSessionBuilder {
            config,
            fields,
            bus: None,
            transport: None,
            sink: None,
            page: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> WidgetKind {
        self.config.widget
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn bus(&self) -> Arc<dyn EventBus> {
        self.bus.clone()
    }

    pub fn editor(&self) -> Arc<dyn EditorAdapter> {
        self.editor.clone()
    }

    pub async fn content(&self) -> String {
        self.editor.content().await
    }

    /// Load new content; the session becomes clean again
    pub async fn set_content(&self, content: String) -> Result<()> {
        self.editor.set_content(content.clone()).await?;
        *self.original_content.write().await = content;
        Ok(())
    }

    /// Apply a user edit
    pub async fn apply_edit(&self, content: String) -> Result<()> {
        self.editor.apply_edit(content).await
    }

    /// Content as last loaded into the session
    pub async fn original_content(&self) -> String {
        self.original_content.read().await.clone()
    }

    /// Whether the content differs from what was last loaded
    pub async fn is_modified(&self) -> bool {
        self.content().await != *self.original_content.read().await
    }

    pub async fn has_unsaved_changes(&self) -> bool {
        self.tracker.has_unsaved_changes().await
    }

    pub async fn is_draft(&self) -> bool {
        self.fields.flag(&self.config.draft_field).await
    }

    pub async fn set_draft(&self, draft: bool) {
        self.fields
            .set(self.config.draft_field.as_str(), draft.to_string())
            .await;
    }

    pub async fn title(&self) -> Option<String> {
        self.fields.value(&self.config.title_field).await
    }

    pub async fn set_title(&self, title: impl Into<String>) {
        self.fields.set(self.config.title_field.as_str(), title).await;
    }

    /// Notification currently shown on this session's indicator
    pub async fn current_status(&self) -> Option<StatusNotification> {
        self.notifier.current().await
    }

    pub fn is_auto_save_running(&self) -> bool {
        self.scheduler
            .as_ref()
            .map(SchedulerHandle::is_running)
            .unwrap_or(false)
    }

    /// Stop the periodic scheduler, waiting for a tick already in flight
    ///
    /// [`save_now`](Self::save_now) keeps working afterwards.
    pub async fn stop_auto_save(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.shutdown().await;
        }
    }

    /// Run the conditional auto-save right away
    ///
    /// Waits for a scheduled attempt already in flight, so the two never
    /// overlap. Returns `None` when no auto-save URL is configured.
    pub async fn save_now(&self) -> Option<SaveOutcome> {
        match &self.saver {
            Some(saver) => Some(saver.perform_auto_save().await),
            None => None,
        }
    }

    pub async fn is_fullscreen(&self) -> bool {
        self.view.read().await.mode.is_fullscreen()
    }

    /// Current page layout
    pub async fn page(&self) -> Page {
        self.view.read().await.page.clone()
    }

    pub async fn enter_fullscreen(&self) -> Result<bool> {
        let has_title = self.fields.contains(&self.config.title_field).await;
        let changed = {
            let mut view = self.view.write().await;
            let View { mode, page } = &mut *view;
            mode.enter(page, has_title)?
        };
        self.announce_presentation(changed, true).await?;
        Ok(changed)
    }

    pub async fn exit_fullscreen(&self) -> Result<bool> {
        let changed = {
            let mut view = self.view.write().await;
            let View { mode, page } = &mut *view;
            mode.exit(page)
        };
        self.announce_presentation(changed, false).await?;
        Ok(changed)
    }

    pub async fn toggle_fullscreen(&self) -> Result<bool> {
        if self.is_fullscreen().await {
            self.exit_fullscreen().await
        } else {
            self.enter_fullscreen().await
        }
    }

    /// Route a key press to the presentation mode; returns whether it changed
    pub async fn handle_key(&self, key: &str) -> Result<bool> {
        let has_title = self.fields.contains(&self.config.title_field).await;
        let (changed, fullscreen) = {
            let mut view = self.view.write().await;
            let View { mode, page } = &mut *view;
            let changed = mode.handle_key(Key::parse(key), page, has_title)?;
            (changed, mode.is_fullscreen())
        };
        self.announce_presentation(changed, fullscreen).await?;
        Ok(changed)
    }

    async fn announce_presentation(&self, changed: bool, fullscreen: bool) -> Result<()> {
        if !changed {
            return Ok(());
        }
        self.bus
            .publish(EditorEvent::presentation_changed(self.id, fullscreen))
            .await
    }

    /// Stop auto-saving and detach from the event bus
    ///
    /// A submission already in flight is allowed to finish.
    pub async fn teardown(mut self) -> Result<()> {
        self.stop_auto_save().await;

        self.exit_fullscreen().await?;
        self.bus.unsubscribe(self.subscription).await?;
        self.bus
            .publish(EditorEvent::session_closed(self.id))
            .await?;

        tracing::info!("Editing session {} closed", self.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{RecordingSink, Severity};
    use crate::presentation::EXIT_REGION;
    use crate::transport::MemoryTransport;
    use scribe_core::ScribeError;
    use std::time::Duration;

    fn fields(draft: bool) -> Arc<FieldStore> {
        Arc::new(FieldStore::with_fields([
            ("txt_content", "# Draft"),
            ("title", "Hello"),
            ("draft", if draft { "true" } else { "false" }),
        ]))
    }

    fn config(url: Option<&str>) -> EditorConfig {
        EditorConfig {
            auto_save_url: url.map(str::to_string),
            auto_save_interval_ms: 1000,
            ..EditorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_content_field_fails_fast() {
        let fields = Arc::new(FieldStore::with_fields([("title", "Hello")]));
        let result = EditorSession::builder(config(None), fields).build().await;

        assert!(matches!(result, Err(ScribeError::Session(_))));
    }

    #[tokio::test]
    async fn test_without_url_auto_save_is_disabled() {
        let session = EditorSession::builder(config(None), fields(true))
            .build()
            .await
            .unwrap();

        assert!(!session.is_auto_save_running());
        session.apply_edit("# Draft!".to_string()).await.unwrap();
        assert!(session.has_unsaved_changes().await);
        assert!(session.save_now().await.is_none());
        session.teardown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_then_tick_saves_draft() {
        let transport = Arc::new(MemoryTransport::new());
        let sink = Arc::new(RecordingSink::new());
        let session = EditorSession::builder(config(Some("http://localhost/autosave")), fields(true))
            .transport(transport.clone())
            .sink(sink.clone())
            .build()
            .await
            .unwrap();
        assert!(session.is_auto_save_running());
        assert_eq!(session.kind(), WidgetKind::EasyMde);

        session.apply_edit("# Draft, edited".to_string()).await.unwrap();
        assert_eq!(
            session.current_status().await.map(|n| n.severity),
            Some(Severity::Pending)
        );

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(transport.request_count(), 1);
        assert!(!session.has_unsaved_changes().await);
        assert_eq!(sink.rendered(Severity::Saved), 1);

        session.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_content_resets_tracking() {
        let session = EditorSession::builder(config(None), fields(true))
            .build()
            .await
            .unwrap();

        session.apply_edit("changed".to_string()).await.unwrap();
        assert!(session.is_modified().await);
        assert!(session.has_unsaved_changes().await);

        session.set_content("reloaded".to_string()).await.unwrap();
        assert!(!session.is_modified().await);
        assert!(!session.has_unsaved_changes().await);
        assert_eq!(session.original_content().await, "reloaded");
    }

    #[tokio::test]
    async fn test_fullscreen_keeps_accessors_working() {
        let session = EditorSession::builder(config(None), fields(true))
            .page(Page::new(["header", "title", "txt_content", "footer"]))
            .build()
            .await
            .unwrap();
        let before = session.page().await;

        assert!(session.handle_key("F11").await.unwrap());
        assert!(session.is_fullscreen().await);
        assert_eq!(session.page().await.regions, vec!["title", "txt_content", EXIT_REGION]);

        session.apply_edit("typed in fullscreen".to_string()).await.unwrap();
        assert_eq!(session.content().await, "typed in fullscreen");
        assert_eq!(session.title().await.as_deref(), Some("Hello"));

        assert!(session.handle_key("Escape").await.unwrap());
        assert_eq!(session.page().await, before);
        assert_eq!(session.content().await, "typed in fullscreen");
    }

    #[tokio::test]
    async fn test_fullscreen_requires_content_region() {
        let page = Page::new(["header", "title", "footer"]);
        let session = EditorSession::builder(config(None), fields(true))
            .page(page.clone())
            .build()
            .await
            .unwrap();

        let result = session.handle_key("F11").await;
        assert!(matches!(result, Err(ScribeError::Presentation(_))));
        assert!(!session.is_fullscreen().await);
        assert_eq!(session.page().await, page);
    }

    #[tokio::test]
    async fn test_teardown_releases_subscription() {
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
        let session = EditorSession::builder(config(None), fields(true))
            .bus(bus.clone())
            .build()
            .await
            .unwrap();
        assert_eq!(bus.subscription_count().await, 1);

        session.toggle_fullscreen().await.unwrap();
        session.teardown().await.unwrap();
        assert_eq!(bus.subscription_count().await, 0);
    }

    #[tokio::test]
    async fn test_draft_and_title_fields() {
        let session = EditorSession::builder(config(None), fields(false))
            .build()
            .await
            .unwrap();

        assert!(!session.is_draft().await);
        session.set_draft(true).await;
        assert!(session.is_draft().await);

        session.set_title("Renamed").await;
        assert_eq!(session.title().await.as_deref(), Some("Renamed"));
    }
}
