//! Watches the edited Markdown file for on-disk changes

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::warn;

/// Turns file system events for one file into debounced change signals
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: UnboundedReceiver<notify::Result<Event>>,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
}

impl DocumentWatcher {
    /// Watch `path` through its parent directory, so atomic-rename saves are seen
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(|name| name.to_os_string());
        let watch_root = target_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            target_path,
            target_name,
            debounce,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Wait for the next change to the file
    ///
    /// Returns false once the watcher can no longer deliver events.
    pub async fn next_change(&mut self) -> bool {
        loop {
            match self.rx.recv().await {
                None => return false,
                Some(Ok(event)) if self.is_relevant(&event) => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => warn!("File watch error: {}", e),
            }
        }

        // Collapse a burst of writes into one change.
        tokio::time::sleep(self.debounce).await;
        while self.rx.try_recv().is_ok() {}
        true
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return false;
        }

        event.paths.iter().any(|path| {
            path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn watcher(dir: &tempfile::TempDir) -> DocumentWatcher {
        let file = dir.path().join("post.md");
        std::fs::write(&file, "# Post").unwrap();
        DocumentWatcher::new(&file, Duration::from_millis(10)).unwrap()
    }

    #[test]
    fn test_relevant_events() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = watcher(&dir);
        let target = watcher.target_path().to_path_buf();

        let modified = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(target.clone());
        assert!(watcher.is_relevant(&modified));

        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(target.clone());
        assert!(watcher.is_relevant(&created));

        let accessed = Event::new(EventKind::Access(AccessKind::Any)).add_path(target);
        assert!(!watcher.is_relevant(&accessed));

        let sibling = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(dir.path().join("other.md"));
        assert!(!watcher.is_relevant(&sibling));
    }

    #[tokio::test]
    async fn test_detects_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(&dir);

        std::fs::write(watcher.target_path(), "# Post, revised").unwrap();
        let changed =
            tokio::time::timeout(Duration::from_secs(5), watcher.next_change()).await;

        assert_eq!(changed.ok(), Some(true));
    }
}
