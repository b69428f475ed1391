//! Incremental recognition of reply options in a streamed completion.
//!
//! Delta text is appended to a raw buffer that never shrinks. After every
//! append the buffer is re-examined, in order:
//!
//! 1. no braces at all: the whole text is one `single` option
//! 2. first `{` to last `}` parses as an object with `options` (up to three)
//!    or `content`
//! 3. longer than [`DEGRADE_THRESHOLD_CHARS`]: stripped text as `single`
//!
//! Once labelled options have been shown, their labels stay fixed at their
//! positions for the rest of the stream. Later parses may change text or add
//! options, never remove or relabel them.

use async_stream::stream;
use futures::{Stream, StreamExt};
use openrouter_client::{ChatCompletionChunk, StreamEvent};
use serde_json::Value;
use std::pin::Pin;
use tracing::{debug, trace};

use super::degrade::{self, DEGRADE_THRESHOLD_CHARS};
use super::options::{OptionLabel, ReplyOption, ReplyResult};
use super::DecodeError;
use crate::error::AssistError;

/// Most options taken from an `options` array.
pub const MAX_OPTIONS: usize = 3;

/// Stream of reply projections produced by [`ReplyDecoder::decode`].
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<ReplyResult, AssistError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Accumulating,
    Finalized,
}

/// What one pass over the raw buffer found.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Recognition {
    Options(Vec<ReplyOption>),
    Single(String),
}

#[derive(Debug)]
pub struct ReplyDecoder {
    raw: String,
    current: Option<ReplyResult>,
    state: DecoderState,
}

impl Default for ReplyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyDecoder {
    pub fn new() -> Self {
        Self {
            raw: String::new(),
            current: None,
            state: DecoderState::Accumulating,
        }
    }

    /// Everything received so far.
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Last emitted projection.
    pub fn current(&self) -> Option<&ReplyResult> {
        self.current.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.state == DecoderState::Finalized
    }

    /// Consume one stream event.
    ///
    /// Returns the new projection when it changed. A terminator always
    /// returns the final projection.
    pub fn feed(&mut self, event: StreamEvent) -> Result<Option<ReplyResult>, DecodeError> {
        if self.is_finalized() {
            return Err(DecodeError::Finalized);
        }

        match event {
            StreamEvent::Data(payload) => Ok(self.on_data(&payload)),
            StreamEvent::Terminator => self.finish().map(Some),
        }
    }

    /// Finalize as if a terminator had arrived.
    pub fn finish(&mut self) -> Result<ReplyResult, DecodeError> {
        if self.is_finalized() {
            return Err(DecodeError::Finalized);
        }
        self.state = DecoderState::Finalized;

        if self.raw.trim().is_empty() {
            return Err(DecodeError::EmptyReply);
        }

        match recognize(&self.raw) {
            Some(found) => {
                self.apply(found);
            }
            None if self.current.as_ref().is_some_and(ReplyResult::is_structured) => {}
            None => {
                // A projection shown earlier may only cover a prefix of the text
                let stripped = degrade::strip_envelope(&self.raw);
                debug!(chars = self.raw.chars().count(), "Degrading unparsed reply at end of stream");
                if !stripped.is_empty() {
                    self.apply(Recognition::Single(stripped));
                }
            }
        }

        let mut result = self.current.take().ok_or(DecodeError::EmptyReply)?;
        result.finalized = true;
        self.current = Some(result.clone());
        Ok(result)
    }

    fn on_data(&mut self, payload: &str) -> Option<ReplyResult> {
        let delta = match ChatCompletionChunk::parse(payload) {
            Ok(chunk) => chunk.delta_text()?,
            Err(e) => {
                trace!(error = %e, "Discarding unparseable stream frame");
                return None;
            }
        };

        self.raw.push_str(&delta);

        let found = recognize(&self.raw)?;
        if self.apply(found) {
            self.current.clone()
        } else {
            None
        }
    }

    /// Merge a recognition into the current projection. Returns whether the
    /// projection changed.
    fn apply(&mut self, found: Recognition) -> bool {
        let next = match (&self.current, found) {
            (Some(current), found) if current.is_structured() => {
                let mut options = current.options.clone();
                if let Recognition::Options(parsed) = found {
                    for (i, option) in parsed.into_iter().enumerate() {
                        match options.get_mut(i) {
                            Some(existing) => existing.text = option.text,
                            None => options.push(option),
                        }
                    }
                }
                options
            }
            (previous, Recognition::Options(options)) => {
                if previous.is_some() {
                    debug!(count = options.len(), "Upgrading to structured options");
                }
                options
            }
            (_, Recognition::Single(text)) => vec![ReplyOption::single(text)],
        };

        if self.current.as_ref().map(|c| &c.options) == Some(&next) {
            return false;
        }
        self.current = Some(ReplyResult {
            options: next,
            finalized: false,
        });
        true
    }

    /// Fold an event stream into a stream of projections.
    ///
    /// A transport that ends without `[DONE]` is finalized as if it had sent
    /// one. Transport errors end the stream after being yielded.
    pub fn decode<S, E>(events: S) -> ReplyStream
    where
        S: Stream<Item = Result<StreamEvent, E>> + Send + 'static,
        E: Into<AssistError> + Send + 'static,
    {
        Box::pin(stream! {
            let mut decoder = ReplyDecoder::new();
            let mut events = Box::pin(events);

            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield Err(e.into());
                        return;
                    }
                };

                let terminal = event == StreamEvent::Terminator;
                match decoder.feed(event) {
                    Ok(Some(result)) => yield Ok(result),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e.into());
                        return;
                    }
                }
                if terminal {
                    return;
                }
            }

            debug!("Stream closed without terminator");
            yield decoder.finish().map_err(AssistError::from);
        })
    }
}

fn recognize(raw: &str) -> Option<Recognition> {
    if raw.trim().is_empty() {
        return None;
    }

    if !raw.contains('{') && !raw.contains('}') {
        return Some(Recognition::Single(raw.to_string()));
    }

    if let Some(found) = parse_envelope(raw) {
        return Some(found);
    }

    if degrade::exceeds_threshold(raw) {
        let stripped = degrade::strip_envelope(raw);
        if !stripped.is_empty() {
            trace!(threshold = DEGRADE_THRESHOLD_CHARS, "Envelope unparsed, degrading");
            return Some(Recognition::Single(stripped));
        }
    }

    None
}

fn parse_envelope(raw: &str) -> Option<Recognition> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }

    let envelope: Value = serde_json::from_str(&raw[start..=end]).ok()?;
    let object = envelope.as_object()?;

    if let Some(items) = object.get("options").and_then(Value::as_array) {
        let options: Vec<ReplyOption> = items
            .iter()
            .take(MAX_OPTIONS)
            .enumerate()
            .filter_map(|(position, item)| {
                let text = item.get("content")?.as_str()?;
                let kind = item.get("type").and_then(Value::as_str);
                Some(ReplyOption::new(OptionLabel::from_type(kind, position), text))
            })
            .collect();
        return (!options.is_empty()).then_some(Recognition::Options(options));
    }

    object
        .get("content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map(|content| Recognition::Single(content.to_string()))
}
