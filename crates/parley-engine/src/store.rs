//! Conversation state management.
//!
//! [`ConversationStore`] is the single source of truth for all conversations
//! and the current selection. Every mutation replaces the affected
//! conversation wholesale and then writes the full collection to the backend.
//!
//! Invariants maintained after [`ConversationStore::initialize`]:
//! - the collection is never empty
//! - deleting the current conversation moves the selection to the first one
//! - `updated_at` never moves backwards

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::conversation::{self, Conversation, Message, Reaction, Role, DEFAULT_TITLE};
use crate::persistence::KeyValueStore;

/// Namespace key the collection is stored under.
pub const STORAGE_KEY: &str = "parley-conversations";

/// Fields to merge into a conversation via [`ConversationStore::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationPatch {
    pub title: Option<String>,
    pub messages: Option<Vec<Message>>,
}

impl ConversationPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            messages: None,
        }
    }

    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            title: None,
            messages: Some(messages),
        }
    }

    /// Build the replacement conversation.
    fn apply(self, current: &Conversation, now: DateTime<Utc>) -> Conversation {
        Conversation {
            id: current.id.clone(),
            title: self.title.unwrap_or_else(|| current.title.clone()),
            messages: self.messages.unwrap_or_else(|| current.messages.clone()),
            created_at: current.created_at,
            updated_at: now.max(current.updated_at),
        }
    }
}

/// How [`ConversationStore::initialize`] populated the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// Loaded this many conversations from the backend.
    Loaded(usize),
    /// Nothing usable was stored; one empty conversation was synthesized.
    Fresh,
    /// The store had already been initialized.
    AlreadyInitialized,
}

/// Owns the conversation collection and the current selection.
#[derive(Debug)]
pub struct ConversationStore<B> {
    backend: B,
    key: String,
    conversations: Vec<Conversation>,
    current_id: Option<String>,
    initialized: bool,
}

impl<B: KeyValueStore> ConversationStore<B> {
    /// Create an uninitialized store over `backend`, using [`STORAGE_KEY`].
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, STORAGE_KEY)
    }

    /// Create an uninitialized store using a custom namespace key.
    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            conversations: Vec::new(),
            current_id: None,
            initialized: false,
        }
    }

    /// Create and initialize a store in one step.
    pub fn open(backend: B) -> Self {
        let mut store = Self::new(backend);
        store.initialize();
        store
    }

    /// Load the persisted collection, or bootstrap a fresh conversation.
    ///
    /// Runs once; later calls return [`Bootstrap::AlreadyInitialized`].
    /// A fresh bootstrap writes nothing until the next mutation.
    pub fn initialize(&mut self) -> Bootstrap {
        if self.initialized {
            return Bootstrap::AlreadyInitialized;
        }
        self.initialized = true;

        match self.load() {
            Some(conversations) if !conversations.is_empty() => {
                let count = conversations.len();
                self.current_id = Some(conversations[0].id.clone());
                self.conversations = conversations;
                info!(count, key = %self.key, "Loaded conversations");
                Bootstrap::Loaded(count)
            }
            _ => {
                let fresh = Conversation::new();
                debug!(conversation_id = %fresh.id, "Bootstrapped empty conversation");
                self.current_id = Some(fresh.id.clone());
                self.conversations = vec![fresh];
                Bootstrap::Fresh
            }
        }
    }

    /// Tear the store down, handing back the backend.
    pub fn teardown(self) -> B {
        self.backend
    }

    /// Write the full collection to the backend.
    ///
    /// Skipped while the collection is empty so a transient empty state never
    /// overwrites durable data. Write failures are logged and swallowed.
    pub fn persist(&self) {
        if self.conversations.is_empty() {
            debug!("Skipping persist of empty collection");
            return;
        }

        let payload = match serde_json::to_string(&self.conversations) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize conversations");
                return;
            }
        };

        if let Err(e) = self.backend.put(&self.key, &payload) {
            warn!(error = %e, "Failed to persist conversations; changes will not survive a restart");
        }
    }

    /// All conversations in display order (most recently created first).
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Id of the current selection, which may not resolve.
    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// The conversation matching the current selection, if it resolves.
    pub fn current(&self) -> Option<&Conversation> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    /// Look up a conversation by id.
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Merge `patch` into the conversation with `id` and refresh its `updated_at`.
    ///
    /// An unknown id is ignored; the collection is persisted either way.
    /// Returns whether a conversation matched.
    pub fn update(&mut self, id: &str, patch: ConversationPatch) -> bool {
        let now = conversation::now();
        let matched = match self.conversations.iter_mut().find(|c| c.id == id) {
            Some(slot) => {
                *slot = patch.apply(slot, now);
                true
            }
            None => {
                debug!(conversation_id = %id, "Update ignored: no such conversation");
                false
            }
        };
        self.persist();
        matched
    }

    /// Create an empty conversation at the front and make it current.
    pub fn create_new(&mut self) -> String {
        let fresh = Conversation::new();
        let id = fresh.id.clone();
        self.conversations.insert(0, fresh);
        self.current_id = Some(id.clone());
        self.persist();
        id
    }

    /// Delete a conversation.
    ///
    /// Deleting the last conversation replaces it with a fresh one in the same
    /// step. Deleting the current conversation selects the first remaining one.
    /// Returns whether anything was deleted.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            debug!(conversation_id = %id, "Delete ignored: no such conversation");
            return false;
        }

        if self.conversations.is_empty() {
            let fresh = Conversation::new();
            self.current_id = Some(fresh.id.clone());
            self.conversations.push(fresh);
        } else if self.current_id.as_deref() == Some(id) {
            self.current_id = Some(self.conversations[0].id.clone());
        }

        self.persist();
        true
    }

    /// Select a conversation. Existence is checked by [`Self::current`].
    pub fn switch_current(&mut self, id: impl Into<String>) {
        self.current_id = Some(id.into());
    }

    /// Give a conversation an explicit title.
    pub fn rename(&mut self, id: &str, title: impl Into<String>) -> bool {
        self.update(id, ConversationPatch::title(title))
    }

    /// Append a user message.
    ///
    /// The first user message also derives the title, unless the conversation
    /// was renamed before it.
    pub fn record_user_message(&mut self, id: &str, content: impl Into<String>) -> Option<Message> {
        let message = Message::user(content);
        let patch = {
            let convo = self.get(id)?;
            let title = (!convo.has_user_message() && convo.title == DEFAULT_TITLE)
                .then(|| conversation::derive_title(&message.content));
            let mut messages = convo.messages.clone();
            messages.push(message.clone());
            ConversationPatch {
                title,
                messages: Some(messages),
            }
        };
        self.update(id, patch);
        Some(message)
    }

    /// Append a freshly received reply, flagged for the typing reveal.
    pub fn record_reply(&mut self, id: &str, reply: impl Into<String>) -> Option<Message> {
        self.append(id, Message::reply(reply))
    }

    /// Append an assistant-role error diagnostic.
    pub fn record_failure(&mut self, id: &str, diagnostic: impl Into<String>) -> Option<Message> {
        self.append(id, Message::failure(diagnostic))
    }

    /// Toggle a reaction on an assistant message.
    ///
    /// Returns the resulting reaction, or `None` if nothing was changed
    /// (unknown ids or a user message).
    pub fn toggle_reaction(
        &mut self,
        conversation_id: &str,
        message_id: &str,
        reaction: Reaction,
    ) -> Option<Option<Reaction>> {
        let mut result = None;
        self.modify_message(conversation_id, message_id, |message| {
            if message.role != Role::Assistant {
                return false;
            }
            message.reaction = Reaction::toggle(message.reaction, reaction);
            result = Some(message.reaction);
            true
        });
        result
    }

    /// Clear the `is_typing` flag once a reveal has completed.
    pub fn finish_typing(&mut self, conversation_id: &str, message_id: &str) -> bool {
        self.modify_message(conversation_id, message_id, |message| {
            if !message.is_typing {
                return false;
            }
            message.is_typing = false;
            true
        })
    }

    fn append(&mut self, id: &str, message: Message) -> Option<Message> {
        let Some(convo) = self.get(id) else {
            debug!(conversation_id = %id, "Append ignored: no such conversation");
            return None;
        };
        let mut messages = convo.messages.clone();
        messages.push(message.clone());
        self.update(id, ConversationPatch::messages(messages));
        Some(message)
    }

    /// Apply `edit` to a copy of one message and write it back if it reports a change.
    fn modify_message(
        &mut self,
        conversation_id: &str,
        message_id: &str,
        edit: impl FnOnce(&mut Message) -> bool,
    ) -> bool {
        let Some(convo) = self.get(conversation_id) else {
            debug!(%conversation_id, "Message edit ignored: no such conversation");
            return false;
        };
        let mut messages = convo.messages.clone();
        let Some(message) = messages.iter_mut().find(|m| m.id == message_id) else {
            debug!(%conversation_id, %message_id, "Message edit ignored: no such message");
            return false;
        };
        if !edit(message) {
            return false;
        }
        self.update(conversation_id, ConversationPatch::messages(messages))
    }

    /// Read the stored collection. Missing, unreadable and malformed data all
    /// come back as `None`.
    fn load(&self) -> Option<Vec<Conversation>> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored conversations");
                return None;
            }
        };

        match decode_collection(&raw) {
            Ok(conversations) => Some(conversations),
            Err(e) => {
                warn!(error = %e, "Stored conversations are malformed; starting fresh");
                None
            }
        }
    }
}

/// Stored conversation record, before role validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConversation {
    id: String,
    title: String,
    #[serde(default)]
    messages: Vec<StoredMessage>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMessage {
    id: String,
    role: String,
    content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    is_typing: bool,
    #[serde(default)]
    reaction: Option<Reaction>,
}

/// Decode a stored payload, validating roles at the boundary.
///
/// Messages with an unknown role are dropped. User messages never carry a
/// typing flag or a reaction.
fn decode_collection(raw: &str) -> Result<Vec<Conversation>, serde_json::Error> {
    let stored: Vec<StoredConversation> = serde_json::from_str(raw)?;

    Ok(stored
        .into_iter()
        .map(|convo| {
            let messages = convo
                .messages
                .into_iter()
                .filter_map(|m| {
                    let Some(role) = Role::parse(&m.role) else {
                        warn!(
                            conversation_id = %convo.id,
                            message_id = %m.id,
                            role = %m.role,
                            "Dropping stored message with unknown role"
                        );
                        return None;
                    };
                    let assistant = role == Role::Assistant;
                    Some(Message {
                        id: m.id,
                        role,
                        content: m.content,
                        timestamp: m.timestamp,
                        is_typing: assistant && m.is_typing,
                        reaction: m.reaction.filter(|_| assistant),
                    })
                })
                .collect();

            Conversation {
                id: convo.id,
                title: convo.title,
                messages,
                created_at: convo.created_at,
                updated_at: convo.updated_at,
            }
        })
        .collect())
}
