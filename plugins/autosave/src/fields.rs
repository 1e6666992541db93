//! Form fields shared between the editor, the page and the auto-saver

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Named string values, the way a form exposes its inputs by id
#[derive(Debug, Default)]
pub struct FieldStore {
    values: RwLock<HashMap<String, String>>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `(id, value)` pairs
    pub fn with_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub async fn value(&self, id: &str) -> Option<String> {
        self.values.read().await.get(id).cloned()
    }

    pub async fn set(&self, id: impl Into<String>, value: impl Into<String>) {
        self.values.write().await.insert(id.into(), value.into());
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.values.read().await.contains_key(id)
    }

    /// A flag field is set only when its value is exactly `"true"`
    pub async fn flag(&self, id: &str) -> bool {
        self.values.read().await.get(id).map(String::as_str) == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flag_requires_exact_true() {
        let fields = FieldStore::with_fields([("draft", "true"), ("published", "TRUE")]);

        assert!(fields.flag("draft").await);
        assert!(!fields.flag("published").await);
        assert!(!fields.flag("missing").await);

        fields.set("draft", "false").await;
        assert!(!fields.flag("draft").await);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let fields = FieldStore::new();
        assert!(!fields.contains("title").await);

        fields.set("title", "Hello").await;
        fields.set("title", "Hello again").await;
        assert_eq!(fields.value("title").await.as_deref(), Some("Hello again"));
    }
}
