//! Channel trait and the message types that flow through it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A line of text received from a user on some channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the channel that received it ("telegram", "cli").
    pub channel: String,
    /// Stable external identifier of the sender.
    pub user_id: String,
    /// Human-readable sender name, if the platform provides one.
    pub user_name: Option<String>,
    pub content: String,
    /// Channel-specific routing data (e.g. Telegram `chat_id`).
    pub metadata: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            content: content.to_string(),
            metadata: serde_json::json!({}),
            received_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }
}

/// Formatting hint for outgoing text. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    #[default]
    Plain,
    Markdown,
}

/// A reply to send back on the channel a message arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
    pub format: MessageFormat,
    /// Reply keyboard rows, for channels that support buttons.
    pub keyboard: Option<Vec<Vec<String>>>,
}

impl OutgoingResponse {
    /// Plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: MessageFormat::Plain,
            keyboard: None,
        }
    }

    /// Markdown-formatted reply.
    pub fn markdown(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: MessageFormat::Markdown,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, rows: Vec<Vec<String>>) -> Self {
        self.keyboard = Some(rows);
        self
    }
}

/// A chat transport: delivers inbound lines and sends replies.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name, matched against `IncomingMessage::channel`.
    fn name(&self) -> &str;

    /// Begin receiving. Messages for one user arrive in order.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Send a reply to the chat `msg` came from.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}
