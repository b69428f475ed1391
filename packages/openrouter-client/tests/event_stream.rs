//! Framing a realistic response body split mid-token.

use futures::StreamExt;
use openrouter_client::{ChatCompletionChunk, EventStream, StreamEvent};

#[tokio::test]
async fn test_mid_token_split_reassembles_deltas() {
    let chunks = vec![
        "data: {\"choices\":[{\"delta\":{\"content\":\"{\\\"opt\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"con",
        "tent\":\"ions\\\":[]}\"}}]}\n",
        "data: [DONE]\n",
    ];

    let events: Vec<StreamEvent> = EventStream::from_chunks(chunks)
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[2], StreamEvent::Terminator);

    let text: String = events
        .into_iter()
        .filter_map(|event| match event {
            StreamEvent::Data(payload) => ChatCompletionChunk::parse(&payload).ok(),
            StreamEvent::Terminator => None,
        })
        .filter_map(ChatCompletionChunk::delta_text)
        .collect();

    assert_eq!(text, r#"{"options":[]}"#);
}
