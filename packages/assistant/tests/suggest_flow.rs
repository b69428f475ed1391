//! End-to-end sessions against a canned completion stream.

use assistant_core::{
    AssistError, MemorySettingsStore, OptionLabel, ReplyAssistant, SettingKey, Settings,
    SuggestionRequest,
};
use async_trait::async_trait;
use futures::StreamExt;
use openrouter_client::{ChatRequest, ChatStreamer, EventStream, SecretString};
use page_extraction::{ExtractionOrchestrator, HtmlDocument};
use std::sync::{Arc, Mutex};

/// Replays fixed body chunks and records what was requested.
struct CannedStreamer {
    chunks: Vec<Vec<u8>>,
    requests: Arc<Mutex<Vec<(String, ChatRequest)>>>,
}

impl CannedStreamer {
    fn new(chunks: Vec<Vec<u8>>) -> (Self, Arc<Mutex<Vec<(String, ChatRequest)>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                chunks,
                requests: requests.clone(),
            },
            requests,
        )
    }
}

#[async_trait]
impl ChatStreamer for CannedStreamer {
    async fn stream_chat(
        &self,
        api_key: &SecretString,
        request: ChatRequest,
    ) -> openrouter_client::Result<EventStream> {
        self.requests
            .lock()
            .unwrap()
            .push((api_key.expose().to_string(), request));
        Ok(EventStream::from_chunks(self.chunks.clone()))
    }
}

/// SSE body carrying `text` as one delta per `piece` characters, cut into
/// transport chunks of `cut` bytes (multi-byte characters may be split).
fn sse_body(text: &str, piece: usize, cut: usize, done: bool) -> Vec<Vec<u8>> {
    let chars: Vec<char> = text.chars().collect();
    let mut body = String::new();
    for delta in chars.chunks(piece) {
        let delta: String = delta.iter().collect();
        let frame = serde_json::json!({ "choices": [{ "delta": { "content": delta } }] });
        body.push_str(&format!("data: {}\n\n", frame));
    }
    if done {
        body.push_str("data: [DONE]\n\n");
    }

    body.as_bytes().chunks(cut).map(<[u8]>::to_vec).collect()
}

fn settings_with_key() -> Settings {
    let store = MemorySettingsStore::new().with(SettingKey::ApiKey, "sk-or-test");
    Settings::load(Arc::new(store)).unwrap()
}

const ENVELOPE: &str = r#"{"options":[{"type":"thoughtful","content":"Lifetimes tie borrows to owners."},{"type":"concise","content":"Add a lifetime."},{"type":"friendly","content":"Been there! Try 'a."}]}"#;

const PAGE: &str = r#"
<html><body>
  <shreddit-post post-type="text">
    <h1 slot="title">Lifetime error</h1>
    <div slot="text-body"><p>Help me understand this.</p></div>
  </shreddit-post>
  <shreddit-comment><div slot="comment"><p>Show the code please.</p></div></shreddit-comment>
</body></html>
"#;

#[tokio::test]
async fn test_suggest_streams_three_labelled_options() {
    let (streamer, requests) = CannedStreamer::new(sse_body(ENVELOPE, 4, 13, true));
    let assistant = ReplyAssistant::new(streamer, settings_with_key(), "test/model");

    let request = SuggestionRequest {
        original_post: "Lifetime error\n\nHelp me understand this.".into(),
        subreddit: "rust".into(),
        ..Default::default()
    };
    let results: Vec<_> = assistant.suggest(&request).await.unwrap().collect().await;

    let last = results.last().unwrap().as_ref().unwrap();
    assert!(last.finalized);
    assert_eq!(
        last.labels(),
        vec![OptionLabel::Detailed, OptionLabel::Concise, OptionLabel::Friendly]
    );
    assert_eq!(last.options[2].text, "Been there! Try 'a.");
    assert!(results[..results.len() - 1]
        .iter()
        .all(|r| !r.as_ref().unwrap().finalized));

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (key, chat) = &requests[0];
    assert_eq!(key, "sk-or-test");
    assert_eq!(chat.model, "test/model");
    assert_eq!(chat.messages.len(), 1);
    assert_eq!(chat.messages[0].role, "user");
    assert!(chat.messages[0].content.contains("Subreddit: rust"));
}

#[tokio::test]
async fn test_missing_credential_fails_before_request() {
    let (streamer, requests) = CannedStreamer::new(sse_body("unused", 3, 64, true));
    let settings = Settings::load(Arc::new(MemorySettingsStore::new())).unwrap();
    let assistant = ReplyAssistant::new(streamer, settings, "test/model");

    let result = assistant.suggest(&SuggestionRequest::default()).await;
    assert!(matches!(result, Err(AssistError::MissingCredential)));

    let result = assistant.translate("hello").await;
    assert!(matches!(result, Err(AssistError::MissingCredential)));

    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_plain_reply_without_done_is_finalized() {
    let (streamer, _) = CannedStreamer::new(sse_body("Just try cloning it.", 5, 7, false));
    let assistant = ReplyAssistant::new(streamer, settings_with_key(), "test/model");

    let results: Vec<_> = assistant
        .suggest(&SuggestionRequest::default())
        .await
        .unwrap()
        .collect()
        .await;

    let last = results.last().unwrap().as_ref().unwrap();
    assert!(last.finalized);
    assert_eq!(last.labels(), vec![OptionLabel::Single]);
    assert_eq!(last.options[0].text, "Just try cloning it.");
}

#[tokio::test]
async fn test_custom_requirements_override_stored() {
    let store = MemorySettingsStore::new()
        .with(SettingKey::ApiKey, "sk-or-test")
        .with(SettingKey::AdditionalRequirements, "Stored requirement");
    let settings = Settings::load(Arc::new(store)).unwrap();
    let (streamer, _) = CannedStreamer::new(Vec::new());
    let assistant = ReplyAssistant::new(streamer, settings, "test/model");

    let stored = assistant.suggestion_prompt(&SuggestionRequest::default());
    assert!(stored.contains("Additional requirements: Stored requirement"));

    let custom = assistant
        .suggestion_prompt(&SuggestionRequest::default().with_requirements("Use British spelling"));
    assert!(custom.contains("Additional requirements: Use British spelling"));
    assert!(!custom.contains("Stored requirement"));
}

#[tokio::test]
async fn test_request_built_from_page() {
    let doc = HtmlDocument::parse(PAGE)
        .with_url("https://www.reddit.com/r/rust/comments/xyz/lifetime_error/")
        .unwrap();
    let orchestrator = ExtractionOrchestrator::default();
    let snapshot = orchestrator.snapshot(&doc);
    let comment = orchestrator.find_comments(&doc)[0];
    let comment_text = orchestrator.extract_comment(&doc, comment).value.unwrap();

    let request = SuggestionRequest::for_post(&snapshot).replying_to(comment_text);

    let (streamer, _) = CannedStreamer::new(Vec::new());
    let assistant = ReplyAssistant::new(streamer, settings_with_key(), "test/model");
    let prompt = assistant.suggestion_prompt(&request);

    assert!(prompt.contains("Original post: Lifetime error\n\nHelp me understand this."));
    assert!(prompt.contains("Reply to: Show the code please."));
    assert!(prompt.contains("Subreddit: rust"));
}

#[tokio::test]
async fn test_translate_yields_accumulated_text() {
    let (streamer, requests) = CannedStreamer::new(sse_body("## 中文翻译\n你好", 2, 5, true));
    let assistant = ReplyAssistant::new(streamer, settings_with_key(), "test/model");

    let updates: Vec<String> = assistant
        .translate("Hello")
        .await
        .unwrap()
        .map(|update| update.unwrap())
        .collect()
        .await;

    assert_eq!(updates.last().map(String::as_str), Some("## 中文翻译\n你好"));
    for pair in updates.windows(2) {
        assert!(pair[1].starts_with(&pair[0]));
    }

    let requests = requests.lock().unwrap();
    assert!(requests[0].1.messages[0].content.contains("\n\nHello\n\n"));
}
