use crate::Result;
use futures::Stream as FutStream;
use std::future::Future;
use tokio::sync::mpsc;

const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Stream of items produced by a background task.
///
/// The task is aborted when the stream is dropped.
pub struct Stream<T: Send + 'static> {
    receiver: mpsc::Receiver<Result<T>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: Send + 'static> Drop for Stream<T> {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Spawn `producer` with the sending half of a channel of `capacity`
    /// (0 selects the default).
    pub(crate) fn spawn<F, Fut>(capacity: usize, producer: F) -> Self
    where
        F: FnOnce(mpsc::Sender<Result<T>>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let capacity = if capacity == 0 {
            DEFAULT_CHANNEL_CAPACITY
        } else {
            capacity
        };
        let (tx, rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(producer(tx));
        Self {
            receiver: rx,
            _handle: handle,
        }
    }

    /// Receive the next item from the stream
    pub async fn next(&mut self) -> Option<Result<T>> {
        self.receiver.recv().await
    }
}

impl<T: Send + 'static> FutStream for Stream<T> {
    type Item = Result<T>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
