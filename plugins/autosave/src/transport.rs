//! Delivery of auto-save requests to the remote endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

use crate::AutoSaveError;

/// Body of an auto-save POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub title: String,
    pub content: String,
    pub draft: bool,
    pub auto_save: bool,
}

impl SaveRequest {
    /// Build the request for a draft auto-save
    pub fn draft(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            draft: true,
            auto_save: true,
        }
    }
}

/// Sends a [`SaveRequest`] somewhere and reports whether it was accepted
#[async_trait]
pub trait SaveTransport: Send + Sync {
    async fn submit(&self, url: &str, request: &SaveRequest) -> Result<(), AutoSaveError>;
}

/// JSON-over-HTTP transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, AutoSaveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AutoSaveError::Connection(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SaveTransport for HttpTransport {
    async fn submit(&self, url: &str, request: &SaveRequest) -> Result<(), AutoSaveError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| AutoSaveError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Auto-save accepted by {} ({})", url, status);
            Ok(())
        } else {
            Err(AutoSaveError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

/// Scripted reply of a [`MemoryTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Accept,
    Reject(u16),
    Unreachable,
}

/// Transport that records requests and answers from a script
///
/// Replies are consumed in order; once the script runs out every request
/// is accepted.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    script: Mutex<Vec<Reply>>,
    received: Mutex<Vec<(String, SaveRequest)>>,
    delay: Option<Duration>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for the next requests
    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        let mut script: Vec<Reply> = replies.into_iter().collect();
        script.reverse();
        Self {
            script: Mutex::new(script),
            ..Self::default()
        }
    }

    /// Hold every request for `delay` before replying
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, with their target URL
    pub fn requests(&self) -> Vec<(String, SaveRequest)> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl SaveTransport for MemoryTransport {
    async fn submit(&self, url: &str, request: &SaveRequest) -> Result<(), AutoSaveError> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((url.to_string(), request.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()
            .unwrap_or(Reply::Accept);

        match reply {
            Reply::Accept => Ok(()),
            Reply::Reject(status) => Err(AutoSaveError::Rejected { status }),
            Reply::Unreachable => Err(AutoSaveError::Connection(
                "connection refused".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_request_wire_format() {
        let request = SaveRequest::draft("My post", "# Hello");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "title": "My post",
                "content": "# Hello",
                "draft": true,
                "auto_save": true,
            })
        );
    }

    #[tokio::test]
    async fn test_memory_transport_follows_script() {
        let transport =
            MemoryTransport::with_replies([Reply::Reject(500), Reply::Unreachable]);
        let request = SaveRequest::draft("t", "c");

        let first = transport.submit("http://x/autosave", &request).await;
        assert!(matches!(first, Err(AutoSaveError::Rejected { status: 500 })));

        let second = transport.submit("http://x/autosave", &request).await;
        assert!(matches!(second, Err(AutoSaveError::Connection(_))));

        assert!(transport.submit("http://x/autosave", &request).await.is_ok());
        assert_eq!(transport.request_count(), 3);
    }
}
