//! Streaming delivery for provider completions

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Ordered stream of incremental content chunks. Dropping the stream aborts
/// the underlying connection; whatever was delivered before the drop is a
/// partial success.
#[derive(Debug)]
pub struct TokenStream {
    receiver: mpsc::Receiver<String>,
}

impl TokenStream {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Next chunk, in network order.
    pub async fn next(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Drain the stream into a single string.
    pub async fn collect(mut self) -> String {
        let mut result = String::new();
        while let Some(chunk) = self.next().await {
            result.push_str(&chunk);
        }
        result
    }
}

impl Stream for TokenStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
