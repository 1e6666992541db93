//! Fullscreen (distraction-free) presentation of an editing session
//!
//! The page is modeled as an ordered list of regions. Entering fullscreen
//! captures a [`PageSnapshot`] and lays out only the title and content;
//! leaving restores the snapshot exactly. The regions refer to form fields
//! by id, so content and title accessors are unaffected by the mode.

use scribe_core::{Result, ScribeError};
use serde::{Deserialize, Serialize};

/// Region shown in fullscreen to leave the mode
pub const EXIT_REGION: &str = "exit-fullscreen";

/// Layout style of the page container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageStyle {
    #[default]
    Normal,
    /// Fixed overlay covering the viewport
    Overlay,
}

/// The visible page: regions in display order plus the container style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub regions: Vec<String>,
    pub style: PageStyle,
}

impl Page {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            style: PageStyle::Normal,
        }
    }
}

/// Page state captured on entering fullscreen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    regions: Vec<String>,
    style: PageStyle,
}

impl PageSnapshot {
    fn capture(page: &Page) -> Self {
        Self {
            regions: page.regions.clone(),
            style: page.style,
        }
    }

    fn restore(self, page: &mut Page) {
        page.regions = self.regions;
        page.style = self.style;
    }
}

/// Keys the presentation mode reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    F11,
    Escape,
    Other,
}

impl Key {
    /// Parse a key name as reported by keyboard events ("F11", "Escape")
    pub fn parse(name: &str) -> Self {
        match name {
            "F11" => Key::F11,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// Owns the fullscreen state of one session
#[derive(Debug)]
pub struct PresentationMode {
    title_field: String,
    content_field: String,
    snapshot: Option<PageSnapshot>,
}

impl PresentationMode {
    pub fn new(title_field: impl Into<String>, content_field: impl Into<String>) -> Self {
        Self {
            title_field: title_field.into(),
            content_field: content_field.into(),
            snapshot: None,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Switch `page` to fullscreen; returns false if already fullscreen
    ///
    /// The title region is kept only when the page has a title field. Fails,
    /// leaving the page untouched, when the page does not show the content.
    pub fn enter(&mut self, page: &mut Page, has_title: bool) -> Result<bool> {
        if self.is_fullscreen() {
            return Ok(false);
        }
        if !page.regions.contains(&self.content_field) {
            return Err(ScribeError::presentation(format!(
                "Page has no '{}' region to show in fullscreen",
                self.content_field
            )));
        }

        self.snapshot = Some(PageSnapshot::capture(page));

        let mut regions = Vec::with_capacity(3);
        if has_title {
            regions.push(self.title_field.clone());
        }
        regions.push(self.content_field.clone());
        regions.push(EXIT_REGION.to_string());

        page.regions = regions;
        page.style = PageStyle::Overlay;
        tracing::debug!("Entered fullscreen");
        Ok(true)
    }

    /// Restore the page captured by [`enter`](Self::enter); returns false if not fullscreen
    pub fn exit(&mut self, page: &mut Page) -> bool {
        match self.snapshot.take() {
            Some(snapshot) => {
                snapshot.restore(page);
                tracing::debug!("Left fullscreen");
                true
            }
            None => false,
        }
    }

    pub fn toggle(&mut self, page: &mut Page, has_title: bool) -> Result<bool> {
        if self.is_fullscreen() {
            Ok(self.exit(page))
        } else {
            self.enter(page, has_title)
        }
    }

    /// F11 toggles fullscreen, Escape leaves it; returns whether the mode changed
    pub fn handle_key(&mut self, key: Key, page: &mut Page, has_title: bool) -> Result<bool> {
        match key {
            Key::F11 => self.toggle(page, has_title),
            Key::Escape if self.is_fullscreen() => Ok(self.exit(page)),
            _ => Ok(false),
        }
    }
}
