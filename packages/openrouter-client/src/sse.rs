//! Line framing for server-sent events.
//!
//! The completions endpoint streams `data: <json>` lines and finishes with
//! `data: [DONE]`. Network chunks do not respect line boundaries, so bytes are
//! held back until a newline arrives. Holding raw bytes (not text) also keeps
//! multi-byte UTF-8 sequences intact when a chunk splits them.

use bytes::BytesMut;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// A decoded logical event from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Payload of a `data:` line with the prefix stripped.
    Data(String),
    /// The `[DONE]` sentinel.
    Terminator,
}

/// Accumulates raw chunks and yields complete events.
///
/// One buffer serves one stream. Create a new buffer to start over.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    residual: BytesMut,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and iterate over the events it completes.
    ///
    /// The iterator is lazy: lines it does not reach stay buffered and are
    /// yielded by the next `push`.
    pub fn push(&mut self, chunk: impl AsRef<[u8]>) -> Events<'_> {
        self.residual.extend_from_slice(chunk.as_ref());
        Events { buffer: self }
    }

    /// Flush the trailing unterminated line once the transport has closed.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = self.residual.split();
        classify_line(&rest)
    }

    /// Bytes held back waiting for a newline.
    pub fn residual_len(&self) -> usize {
        self.residual.len()
    }
}

/// Events completed by one [`ChunkBuffer::push`].
pub struct Events<'a> {
    buffer: &'a mut ChunkBuffer,
}

impl Iterator for Events<'_> {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        loop {
            let newline = self.buffer.residual.iter().position(|b| *b == b'\n')?;
            let line = self.buffer.residual.split_to(newline + 1);

            if let Some(event) = classify_line(&line[..newline]) {
                return Some(event);
            }
            // Non-data lines ("event:", "id:", ": keep-alive", blanks) are dropped
        }
    }
}

fn classify_line(raw: &[u8]) -> Option<StreamEvent> {
    let text = String::from_utf8_lossy(raw);
    let line = text.strip_suffix('\r').unwrap_or(&text);

    let payload = line.strip_prefix(DATA_PREFIX)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim() == DONE_SENTINEL {
        Some(StreamEvent::Terminator)
    } else {
        Some(StreamEvent::Data(payload.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STREAM: &str = concat!(
        ": OPENROUTER PROCESSING\n",
        "\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"{\\\"opt\"}}]}\n",
        "\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ions\\\": []}\"}}]}\r\n",
        "event: ping\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"caf\u{e9} \u{1f600}\"}}]}\n",
        "data: [DONE]\n",
    );

    fn collect_all(chunks: &[&[u8]]) -> Vec<StreamEvent> {
        let mut buffer = ChunkBuffer::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(buffer.push(chunk));
        }
        events.extend(buffer.finish());
        events
    }

    #[test]
    fn test_classifies_data_and_terminator() {
        let events = collect_all(&[STREAM.as_bytes()]);

        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            StreamEvent::Data(r#"{"choices":[{"delta":{"content":"{\"opt"}}]}"#.to_string())
        );
        assert_eq!(
            events[1],
            StreamEvent::Data(r#"{"choices":[{"delta":{"content":"ions\": []}"}}]}"#.to_string())
        );
        assert_eq!(events[3], StreamEvent::Terminator);
    }

    #[test]
    fn test_many_lines_in_one_chunk() {
        let mut body = String::new();
        for i in 0..2000 {
            body.push_str(&format!("data: {}\n\n", i));
        }
        body.push_str("data: tail");

        let mut buffer = ChunkBuffer::new();
        let events: Vec<_> = buffer.push(&body).collect();

        assert_eq!(events.len(), 2000);
        assert_eq!(events[1999], StreamEvent::Data("1999".into()));
        assert_eq!(buffer.residual_len(), "data: tail".len());
        assert_eq!(buffer.finish(), Some(StreamEvent::Data("tail".into())));
        assert_eq!(buffer.residual_len(), 0);
    }

    #[test]
    fn test_holds_back_partial_line() {
        let mut buffer = ChunkBuffer::new();

        assert_eq!(buffer.push("data: hel").count(), 0);
        assert_eq!(buffer.residual_len(), 9);

        let events: Vec<_> = buffer.push("lo\ndata: [DO").collect();
        assert_eq!(events, vec![StreamEvent::Data("hello".into())]);

        let events: Vec<_> = buffer.push("NE]\n").collect();
        assert_eq!(events, vec![StreamEvent::Terminator]);
        assert_eq!(buffer.residual_len(), 0);
    }

    #[test]
    fn test_prefix_without_space() {
        let events = collect_all(&[&b"data:{\"a\":1}\ndata:[DONE]\n"[..]]);
        assert_eq!(
            events,
            vec![StreamEvent::Data("{\"a\":1}".into()), StreamEvent::Terminator]
        );
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut buffer = ChunkBuffer::new();
        assert_eq!(buffer.push("data: [DONE]").count(), 0);
        assert_eq!(buffer.finish(), Some(StreamEvent::Terminator));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_unconsumed_events_carry_over() {
        let mut buffer = ChunkBuffer::new();
        let first = buffer.push("data: a\ndata: b\n").next();
        assert_eq!(first, Some(StreamEvent::Data("a".into())));

        let rest: Vec<_> = buffer.push("data: c\n").collect();
        assert_eq!(
            rest,
            vec![StreamEvent::Data("b".into()), StreamEvent::Data("c".into())]
        );
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let bytes = "data: caf\u{e9}\n".as_bytes();
        // Split inside the two-byte encoding of 'é'
        let split = bytes.len() - 2;
        let events = collect_all(&[&bytes[..split], &bytes[split..]]);
        assert_eq!(events, vec![StreamEvent::Data("caf\u{e9}".into())]);
    }

    proptest! {
        #[test]
        fn prop_split_points_do_not_change_events(cuts in proptest::collection::vec(0..STREAM.len(), 0..12)) {
            let mut cuts = cuts;
            let bytes = STREAM.as_bytes();
            cuts.sort_unstable();
            cuts.dedup();

            let mut chunks: Vec<&[u8]> = Vec::new();
            let mut start = 0;
            for cut in cuts {
                chunks.push(&bytes[start..cut]);
                start = cut;
            }
            chunks.push(&bytes[start..]);

            prop_assert_eq!(collect_all(&chunks), collect_all(&[bytes]));
        }
    }
}
