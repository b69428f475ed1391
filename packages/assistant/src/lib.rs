//! Thread reply assistant.
//!
//! Ties the two engines together: [`page_extraction`] reads a post snapshot
//! and comments from a page, [`ReplyAssistant`] streams a completion through
//! [`openrouter_client`] and [`reply::ReplyDecoder`] turns the growing text
//! into up to three labelled reply options.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`settings`] - Persisted user settings and their stores
//! - [`prompts`] - Prompt template rendering
//! - [`reply`] - Incremental reply decoding
//! - [`session`] - Suggestion and translation sessions

pub mod config;
pub mod error;
pub mod prompts;
pub mod reply;
pub mod session;
pub mod settings;

pub use config::Config;
pub use error::{AssistError, Result};
pub use reply::{DecodeError, OptionLabel, ReplyDecoder, ReplyOption, ReplyResult, ReplyStream};
pub use session::{ReplyAssistant, SuggestionRequest, TextStream};
pub use settings::{
    JsonFileSettingsStore, MemorySettingsStore, SettingKey, Settings, SettingsStore,
};
