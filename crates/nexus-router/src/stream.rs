//! Single-consumer stream of updates.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use nexus_core::StreamUpdate;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Buffered updates per stream before the producer waits for the consumer.
pub(crate) const UPDATE_BUFFER: usize = 32;

/// Lazy, finite, non-restartable sequence of [`StreamUpdate`]s.
///
/// Backed by a bounded channel. Dropping the stream cancels the producer
/// the next time it tries to publish.
#[derive(Debug)]
pub struct UpdateStream {
    inner: ReceiverStream<StreamUpdate>,
}

impl UpdateStream {
    /// Create a sender/stream pair.
    pub(crate) fn channel() -> (mpsc::Sender<StreamUpdate>, Self) {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        (tx, Self::from_receiver(rx))
    }

    /// Wrap an existing receiver.
    pub fn from_receiver(rx: mpsc::Receiver<StreamUpdate>) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
        }
    }

    /// A stream that yields exactly one update and ends.
    pub fn single(update: StreamUpdate) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 and a fresh channel: this send cannot fail.
        tx.try_send(update).ok();
        Self::from_receiver(rx)
    }

    /// Receive the next update, or `None` once the stream is finished.
    pub async fn recv(&mut self) -> Option<StreamUpdate> {
        self.inner.next().await
    }

    /// Drain the stream, returning every update.
    pub async fn collect_all(mut self) -> Vec<StreamUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = self.recv().await {
            updates.push(update);
        }
        updates
    }
}

impl Stream for UpdateStream {
    type Item = StreamUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_yields_once() {
        let mut stream = UpdateStream::single(StreamUpdate::failure("nope"));
        assert_eq!(stream.next().await, Some(StreamUpdate::failure("nope")));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_channel_closes_when_sender_dropped() {
        let (tx, stream) = UpdateStream::channel();
        tx.send(StreamUpdate::partial("a")).await.unwrap();
        tx.send(StreamUpdate::complete("ab")).await.unwrap();
        drop(tx);

        let updates = stream.collect_all().await;
        assert_eq!(
            updates,
            vec![StreamUpdate::partial("a"), StreamUpdate::complete("ab")]
        );
    }

    #[tokio::test]
    async fn test_dropping_stream_fails_sender() {
        let (tx, stream) = UpdateStream::channel();
        drop(stream);
        assert!(tx.send(StreamUpdate::partial("a")).await.is_err());
    }
}
