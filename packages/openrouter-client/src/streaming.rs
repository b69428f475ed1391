//! Async event stream over a chat completion response body.
//!
//! Converts a raw byte stream into [`StreamEvent`] values using [`ChunkBuffer`].
//! Interpreting the payloads is left to the consumer.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::ClientError;
use crate::sse::{ChunkBuffer, StreamEvent};

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// Stream adapter that frames raw bytes into `StreamEvent` values.
pub struct EventStream {
    inner: ByteStream,
    buffer: ChunkBuffer,
    pending: VecDeque<StreamEvent>,
    exhausted: bool,
}

impl EventStream {
    pub(crate) fn from_response(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self::from_byte_stream(
            byte_stream.map(|chunk| chunk.map_err(|e| ClientError::Network(e.to_string()))),
        )
    }

    /// Wrap any byte stream (a transport other than reqwest, or a test fixture).
    pub fn from_byte_stream(
        byte_stream: impl Stream<Item = Result<Bytes, ClientError>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: ChunkBuffer::new(),
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Stream over fixed chunks, delivered in order.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        I::IntoIter: Send + 'static,
        C: Into<Bytes>,
    {
        Self::from_byte_stream(stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<Bytes, ClientError>(c.into())),
        ))
    }
}

impl Stream for EventStream {
    type Item = Result<StreamEvent, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            if this.exhausted {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.pending.extend(this.buffer.push(&bytes));
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    // Body ended; a final line may lack its newline
                    this.exhausted = true;
                    this.pending.extend(this.buffer.finish());
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
