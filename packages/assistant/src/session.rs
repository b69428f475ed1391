//! Suggestion and translation sessions.
//!
//! A session renders a prompt from the current [`Settings`], opens one
//! streaming completion and hands back a stream the caller re-renders on every
//! item. Sessions are independent; dropping the stream cancels the request.

use async_stream::stream;
use futures::{Stream, StreamExt};
use openrouter_client::{ChatCompletionChunk, ChatRequest, ChatStreamer, Message, SecretString, StreamEvent};
use page_extraction::PostSnapshot;
use std::pin::Pin;
use tracing::{info, trace};
use uuid::Uuid;

use crate::error::{AssistError, Result};
use crate::prompts::{self, ReplyPromptInput};
use crate::reply::{ReplyDecoder, ReplyStream};
use crate::settings::Settings;

/// Accumulated translation text, one item per delta.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// What to suggest a reply for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionRequest {
    /// Title and body of the post
    pub original_post: String,
    pub subreddit: String,
    /// Comment being replied to; `None` for a reply to the post itself
    pub reply_to: Option<String>,
    /// Overrides the stored additional requirements for this request only
    pub custom_requirements: Option<String>,
}

impl SuggestionRequest {
    pub fn for_post(snapshot: &PostSnapshot) -> Self {
        Self {
            original_post: snapshot.original_post(),
            subreddit: snapshot.channel.value().unwrap_or_default().to_string(),
            reply_to: None,
            custom_requirements: None,
        }
    }

    pub fn replying_to(mut self, comment: impl Into<String>) -> Self {
        self.reply_to = Some(comment.into());
        self
    }

    pub fn with_requirements(mut self, requirements: impl Into<String>) -> Self {
        self.custom_requirements = Some(requirements.into());
        self
    }
}

/// Drives suggestion and translation requests against a [`ChatStreamer`].
pub struct ReplyAssistant<S> {
    streamer: S,
    settings: Settings,
    model: String,
}

impl<S: ChatStreamer> ReplyAssistant<S> {
    pub fn new(streamer: S, settings: Settings, model: impl Into<String>) -> Self {
        Self {
            streamer,
            settings,
            model: model.into(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable settings, e.g. for an explicit `reload`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn credential(&self) -> Result<SecretString> {
        self.settings
            .api_key()
            .filter(|key| !key.is_blank())
            .cloned()
            .ok_or(AssistError::MissingCredential)
    }

    /// The reply prompt that `suggest` would send.
    pub fn suggestion_prompt(&self, request: &SuggestionRequest) -> String {
        let requirements = request
            .custom_requirements
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(self.settings.additional_requirements());

        prompts::reply_prompt(
            self.settings.prompt_template(),
            &ReplyPromptInput {
                original_post: &request.original_post,
                reply_content: request.reply_to.as_deref(),
                subreddit: &request.subreddit,
                additional_requirements: requirements,
            },
        )
    }

    /// Request reply options. The returned stream yields the decoder's
    /// projection after every change and ends with a finalized result.
    pub async fn suggest(&self, request: &SuggestionRequest) -> Result<ReplyStream> {
        let api_key = self.credential()?;
        let session_id = Uuid::new_v4();

        let chat = ChatRequest::new(&self.model).message(Message::user(self.suggestion_prompt(request)));

        info!(
            session_id = %session_id,
            model = %self.model,
            subreddit = %request.subreddit,
            is_comment_reply = request.reply_to.is_some(),
            "Requesting reply suggestions"
        );

        let events = self.streamer.stream_chat(&api_key, chat).await?;
        Ok(ReplyDecoder::decode(events))
    }

    /// Translate and explain `content`. Yields the full text so far after
    /// every delta; no envelope recognition is applied.
    pub async fn translate(&self, content: &str) -> Result<TextStream> {
        let api_key = self.credential()?;
        let session_id = Uuid::new_v4();

        let prompt = prompts::translation_prompt(self.settings.translation_prompt(), content);
        let chat = ChatRequest::new(&self.model).message(Message::user(prompt));

        info!(session_id = %session_id, model = %self.model, "Requesting translation");

        let mut events = self.streamer.stream_chat(&api_key, chat).await?;

        Ok(Box::pin(stream! {
            let mut text = String::new();

            while let Some(event) = events.next().await {
                match event {
                    Ok(StreamEvent::Data(payload)) => {
                        let delta = match ChatCompletionChunk::parse(&payload) {
                            Ok(chunk) => chunk.delta_text(),
                            Err(e) => {
                                trace!(error = %e, "Discarding unparseable stream frame");
                                None
                            }
                        };
                        if let Some(delta) = delta {
                            text.push_str(&delta);
                            yield Ok(text.clone());
                        }
                    }
                    Ok(StreamEvent::Terminator) => return,
                    Err(e) => {
                        yield Err(AssistError::from(e));
                        return;
                    }
                }
            }
        }))
    }
}
