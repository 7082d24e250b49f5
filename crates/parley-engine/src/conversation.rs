//! Conversation and message records.
//!
//! These are the units the store persists. The serialized field names
//! (`createdAt`, `isTyping`, ...) and millisecond timestamps are the on-disk
//! format, so renames here are format changes.

use chrono::{DateTime, Local, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a conversation before its first user message.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Number of words kept when deriving a title from the first message.
const TITLE_WORDS: usize = 5;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing into the shell.
    User,
    /// The reply-generation collaborator.
    Assistant,
}

impl Role {
    /// Parse a stored role string. Only the two known roles are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Display label used by the transcript and CLI.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// A thumbs-up or thumbs-down judgment on an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Up,
    Down,
}

impl Reaction {
    /// Apply a toggle: picking the reaction already set clears it.
    pub fn toggle(current: Option<Self>, picked: Self) -> Option<Self> {
        if current == Some(picked) {
            None
        } else {
            Some(picked)
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Up => "👍",
            Self::Down => "👎",
        }
    }

    /// Parse `"up"` / `"down"` (as typed on the command line).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique within the owning conversation.
    pub id: String,
    pub role: Role,
    /// Markdown body, opaque to the engine.
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// True only while an assistant reply is being revealed.
    #[serde(default)]
    pub is_typing: bool,
    #[serde(default)]
    pub reaction: Option<Reaction>,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false)
    }

    /// Create a freshly received assistant reply, flagged for the typing reveal.
    pub fn reply(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), true)
    }

    /// Create an assistant message carrying an error diagnostic.
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self::new(Role::Assistant, diagnostic.into(), false)
    }

    fn new(role: Role, content: String, is_typing: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: now(),
            is_typing,
            reaction: None,
        }
    }
}

/// A titled, timestamped, ordered collection of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with a fresh id and the placeholder title.
    pub fn new() -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a message by id.
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// The most recent assistant message, if any.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }

    /// Whether a user message has been recorded yet.
    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::User)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a conversation title from its first user message.
///
/// Keeps the first five words; appends `...` when more words were dropped.
pub fn derive_title(content: &str) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    let mut title = words[..words.len().min(TITLE_WORDS)].join(" ");
    if words.len() > TITLE_WORDS {
        title.push_str("...");
    }
    title
}

/// Format a timestamp relative to `now` ("Just now", "5m ago", "3h ago", or a date).
pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }

    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d")
        .to_string()
}

/// Current time truncated to the millisecond precision of the stored format.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
