//! parley-engine: Headless core for the parley chat shell
//!
//! This crate provides everything below the UI, including:
//! - The conversation data model and title derivation
//! - A persistent conversation store over pluggable key-value backends
//! - A deadline-driven typing reveal scheduler
//! - The reply-generation client and one-turn exchange
//! - Configuration and data directory resolution

pub mod config;
pub mod conversation;
pub mod persistence;
pub mod reply;
pub mod store;
pub mod typing;

// Re-export commonly used types
pub use config::{config_path, resolve_data_dir, store_dir, Config, ConfigError, ThemeChoice};
pub use conversation::{
    derive_title, format_relative, Conversation, Message, Reaction, Role, DEFAULT_TITLE,
};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, PersistenceError};
pub use reply::{
    error_diagnostic, exchange, interpret_response, record_outcome, HttpReplyClient, ReplyClient,
    ReplyError,
};
pub use store::{Bootstrap, ConversationPatch, ConversationStore, STORAGE_KEY};
pub use typing::{RevealFrame, RevealHandle, RevealState, TypingScheduler, DEFAULT_INTERVAL};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
