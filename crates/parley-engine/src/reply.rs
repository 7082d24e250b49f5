//! Reply-generation collaborator.
//!
//! The chat endpoint takes `{"message": ...}` and answers `{"reply": ...}`.
//! [`exchange`] runs one turn against a [`ConversationStore`]: the user
//! message is recorded before the call starts, and the reply (or a visible
//! error diagnostic) is appended once the call settles.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::conversation::Message;
use crate::persistence::KeyValueStore;
use crate::store::ConversationStore;

/// Errors from the reply collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    /// Non-2xx response; carries the raw body.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, timeout or body-read failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx response that is not a `{"reply": ...}` object.
    #[error("Malformed reply: {0}")]
    Decode(String),

    /// The task running the request died before settling.
    #[error("Reply task failed: {0}")]
    Task(String),
}

/// Something that can answer a user message.
#[async_trait]
pub trait ReplyClient: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String, ReplyError>;
}

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    reply: String,
}

/// HTTP client for the chat endpoint.
#[derive(Debug, Clone)]
pub struct HttpReplyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReplyClient {
    /// Create a client posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ReplyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Create a client from the endpoint and timeout in `config`.
    pub fn from_config(config: &Config) -> Result<Self, ReplyError> {
        Self::new(config.endpoint.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyClient for HttpReplyClient {
    async fn reply(&self, message: &str) -> Result<String, ReplyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ReplyRequest { message })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        interpret_response(status, &body)
    }
}

/// Turn a raw HTTP status and body into a reply or an error.
pub fn interpret_response(status: u16, body: &str) -> Result<String, ReplyError> {
    if !(200..300).contains(&status) {
        return Err(ReplyError::Status {
            status,
            body: body.to_string(),
        });
    }

    serde_json::from_str::<ReplyBody>(body)
        .map(|parsed| parsed.reply)
        .map_err(|e| ReplyError::Decode(e.to_string()))
}

/// Message content shown in the conversation when a reply fails.
pub fn error_diagnostic(error: &ReplyError) -> String {
    format!("❌ Error: {error}")
}

/// Record the outcome of a settled reply call.
pub fn record_outcome<B: KeyValueStore>(
    store: &mut ConversationStore<B>,
    conversation_id: &str,
    outcome: Result<String, ReplyError>,
) -> Option<Message> {
    match outcome {
        Ok(reply) => store.record_reply(conversation_id, reply),
        Err(e) => {
            warn!(%conversation_id, error = %e, "Reply failed");
            store.record_failure(conversation_id, error_diagnostic(&e))
        }
    }
}

/// Run one turn: record `input`, ask `client`, record the answer.
///
/// Returns the appended assistant message, or `None` if the conversation
/// does not exist.
pub async fn exchange<B: KeyValueStore>(
    store: &mut ConversationStore<B>,
    client: &dyn ReplyClient,
    conversation_id: &str,
    input: &str,
) -> Option<Message> {
    store.record_user_message(conversation_id, input)?;
    let outcome = client.reply(input).await;
    record_outcome(store, conversation_id, outcome)
}
