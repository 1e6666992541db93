//! Configuration management for the Scribe system

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Result, ScribeError};

/// Default period between auto-save ticks
pub const DEFAULT_AUTO_SAVE_INTERVAL_MS: u64 = 30_000;

/// Default timeout applied to each auto-save request
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Main system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScribeError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ScribeError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ScribeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ScribeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.editor.validate()?;
        self.logging.validate()
    }

    /// Apply environment variable overrides
    pub fn apply_environment_overrides(
        &mut self,
        env_overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (key, value) in env_overrides {
            match key.as_str() {
                "SCRIBE_AUTOSAVE_URL" => {
                    self.editor.auto_save_url = if value.is_empty() {
                        None
                    } else {
                        Some(value.clone())
                    };
                }
                "SCRIBE_AUTOSAVE_INTERVAL_MS" => {
                    self.editor.auto_save_interval_ms = value.parse().map_err(|_| {
                        ScribeError::Config(format!(
                            "Invalid interval in environment variable: {}",
                            value
                        ))
                    })?;
                }
                "SCRIBE_WIDGET" => {
                    self.editor.widget = value.parse()?;
                }
                "SCRIBE_LOG_LEVEL" => {
                    self.logging.level = value.clone();
                }
                _ => {
                    // Ignore unknown environment variables
                }
            }
        }
        Ok(())
    }

    /// Collect the `SCRIBE_*` variables from the process environment
    pub fn environment_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("SCRIBE_"))
            .collect()
    }
}

/// Construction-time options of an editing session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Field holding the editor content
    pub content_field: String,
    /// Field holding the draft title
    pub title_field: String,
    /// Field whose value `"true"` marks the document as a draft
    pub draft_field: String,
    /// Endpoint receiving auto-save requests; auto-save is off without it
    pub auto_save_url: Option<String>,
    /// Period between auto-save ticks in milliseconds
    pub auto_save_interval_ms: u64,
    /// Timeout for a single auto-save request in milliseconds
    pub request_timeout_ms: u64,
    /// Which editing widget hosts the session
    pub widget: WidgetKind,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            content_field: "txt_content".to_string(),
            title_field: "title".to_string(),
            draft_field: "draft".to_string(),
            auto_save_url: None,
            auto_save_interval_ms: DEFAULT_AUTO_SAVE_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            widget: WidgetKind::default(),
        }
    }
}

impl EditorConfig {
    /// Period between auto-save ticks
    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_millis(self.auto_save_interval_ms)
    }

    /// Timeout for a single auto-save request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("content_field", &self.content_field),
            ("title_field", &self.title_field),
            ("draft_field", &self.draft_field),
        ] {
            if value.trim().is_empty() {
                return Err(ScribeError::config(format!(
                    "editor.{} cannot be empty",
                    name
                )));
            }
        }

        if self.auto_save_interval_ms == 0 {
            return Err(ScribeError::config(
                "editor.auto_save_interval_ms must be greater than 0",
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(ScribeError::config(
                "editor.request_timeout_ms must be greater than 0",
            ));
        }

        if let Some(url) = &self.auto_save_url {
            let parsed = url::Url::parse(url).map_err(|e| {
                ScribeError::config(format!("Invalid auto-save URL '{}': {}", url, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ScribeError::config(format!(
                    "Auto-save URL must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        Ok(())
    }
}

/// The two interchangeable editing widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    /// Full-featured widget with its own toolbar and status bar
    #[default]
    EasyMde,
    /// Lightweight textarea-based widget
    TinyMde,
}

impl WidgetKind {
    /// Identifier of the status indicator this widget renders into
    pub fn indicator_id(&self) -> &'static str {
        match self {
            WidgetKind::EasyMde => "easymde-status",
            WidgetKind::TinyMde => "tinymde-status",
        }
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetKind::EasyMde => write!(f, "easymde"),
            WidgetKind::TinyMde => write!(f, "tinymde"),
        }
    }
}

impl std::str::FromStr for WidgetKind {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easymde" => Ok(WidgetKind::EasyMde),
            "tinymde" => Ok(WidgetKind::TinyMde),
            other => Err(ScribeError::config(format!(
                "Unknown widget '{}', expected 'easymde' or 'tinymde'",
                other
            ))),
        }
    }
}

/// Logging options for the CLI host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    const LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];

    pub fn validate(&self) -> Result<()> {
        let level = self.level.to_ascii_lowercase();
        if Self::LEVELS.contains(&level.as_str()) {
            Ok(())
        } else {
            Err(ScribeError::config(format!(
                "Invalid logging.level '{}', expected one of: {}",
                self.level,
                Self::LEVELS.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_widget_options() {
        let config = EditorConfig::default();
        assert_eq!(config.content_field, "txt_content");
        assert_eq!(config.title_field, "title");
        assert_eq!(config.draft_field, "draft");
        assert_eq!(config.auto_save_interval(), Duration::from_secs(30));
        assert!(config.auto_save_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = EditorConfig {
            auto_save_interval_ms: 0,
            ..EditorConfig::default()
        };
        assert!(config.validate().is_err());

        config.auto_save_interval_ms = 1000;
        config.auto_save_url = Some("ftp://example.com/save".to_string());
        assert!(config.validate().is_err());

        config.auto_save_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.auto_save_url = Some("https://example.com/admin/post/7/autosave".to_string());
        assert!(config.validate().is_ok());

        config.title_field = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_level_is_validated() {
        let mut config = Config::new();
        config.logging.level = "WARN".to_string();
        assert!(config.validate().is_ok());

        config.logging.level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ScribeError::Config(_)));
        assert!(err.to_string().contains("verbose"));

        let mut env = HashMap::new();
        env.insert("SCRIBE_LOG_LEVEL".to_string(), "loud".to_string());
        let mut config = Config::new();
        config.apply_environment_overrides(&env).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scribe.json");
        std::fs::write(
            &path,
            r#"{ "editor": { "auto_save_url": "http://localhost:8080/autosave", "widget": "tinymde" } }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.editor.auto_save_url.as_deref(),
            Some("http://localhost:8080/autosave")
        );
        assert_eq!(config.editor.widget, WidgetKind::TinyMde);
        assert_eq!(config.editor.auto_save_interval_ms, DEFAULT_AUTO_SAVE_INTERVAL_MS);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scribe.json");

        let mut config = Config::new();
        config.editor.auto_save_interval_ms = 5000;
        config.save_to_file(&path).unwrap();

        let reloaded = Config::from_file(&path).unwrap();
        assert_eq!(reloaded.editor.auto_save_interval_ms, 5000);
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = Config::new();
        let mut env = HashMap::new();
        env.insert(
            "SCRIBE_AUTOSAVE_URL".to_string(),
            "http://localhost/autosave".to_string(),
        );
        env.insert("SCRIBE_AUTOSAVE_INTERVAL_MS".to_string(), "1500".to_string());
        env.insert("SCRIBE_WIDGET".to_string(), "TinyMDE".to_string());

        config.apply_environment_overrides(&env).unwrap();
        assert_eq!(
            config.editor.auto_save_url.as_deref(),
            Some("http://localhost/autosave")
        );
        assert_eq!(config.editor.auto_save_interval_ms, 1500);
        assert_eq!(config.editor.widget, WidgetKind::TinyMde);

        env.insert("SCRIBE_AUTOSAVE_INTERVAL_MS".to_string(), "soon".to_string());
        assert!(config.apply_environment_overrides(&env).is_err());
    }

    #[test]
    fn test_widget_indicator_ids() {
        assert_eq!(WidgetKind::EasyMde.indicator_id(), "easymde-status");
        assert_eq!(WidgetKind::TinyMde.indicator_id(), "tinymde-status");
        assert!("quill".parse::<WidgetKind>().is_err());
    }
}
