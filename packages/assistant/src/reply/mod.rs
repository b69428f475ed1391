//! Structured reply decoding for streamed completions.

pub mod decoder;
pub mod degrade;
pub mod options;

pub use decoder::{ReplyDecoder, ReplyStream, MAX_OPTIONS};
pub use options::{OptionLabel, ReplyOption, ReplyResult};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The terminator has already been consumed
    #[error("reply stream already finalized")]
    Finalized,

    /// The stream finished without any recoverable reply text
    #[error("reply stream ended without any reply text")]
    EmptyReply,
}
