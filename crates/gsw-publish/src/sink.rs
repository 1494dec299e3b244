//! Downstream message sink.
//!
//! The webhook URL embeds a credential, so it is never logged or printed by
//! `Debug`.

use std::fmt;

use async_trait::async_trait;
use gsw_schemas::WebhookMessage;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The addressed message no longer exists.
    NotFound,
    Transport(String),
    Api { status: u16, message: String },
    Decode(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::NotFound => write!(f, "published message not found"),
            SinkError::Transport(msg) => write!(f, "transport error: {msg}"),
            SinkError::Api { status, message } => {
                write!(f, "sink api error status={status}: {message}")
            }
            SinkError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Create/update of a single downstream message.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Post a new message, returning its id.
    async fn create(&self, message: &WebhookMessage) -> Result<String, SinkError>;

    /// Edit an existing message in place. `Err(SinkError::NotFound)` if it
    /// was deleted.
    async fn update(&self, message_id: &str, message: &WebhookMessage) -> Result<(), SinkError>;
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct WebhookSink {
    http: reqwest::Client,
    url: String,
}

impl fmt::Debug for WebhookSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSink")
            .field("url", &"<REDACTED>")
            .finish()
    }
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    async fn api_error(resp: reqwest::Response) -> SinkError {
        let status = resp.status().as_u16();
        let message = resp
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| "unknown".to_string());
        SinkError::Api { status, message }
    }
}

#[async_trait]
impl MessageSink for WebhookSink {
    async fn create(&self, message: &WebhookMessage) -> Result<String, SinkError> {
        let resp = self
            .http
            .post(&self.url)
            .query(&[("wait", "true")])
            .json(message)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }

        let created: CreatedMessage = resp
            .json()
            .await
            .map_err(|e| SinkError::Decode(e.without_url().to_string()))?;
        Ok(created.id)
    }

    async fn update(&self, message_id: &str, message: &WebhookMessage) -> Result<(), SinkError> {
        let resp = self
            .http
            .patch(format!("{}/messages/{}", self.url, message_id))
            .json(message)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.without_url().to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SinkError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        Ok(())
    }
}
