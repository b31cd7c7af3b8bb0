use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

use crate::api::error::ApiError;
use crate::api::types::UploadResponse;

/// One item of an upload's progress sequence.
#[derive(Debug)]
pub enum UploadEvent {
    /// Fraction of file content handed to the transport, in `[0.0, 1.0]`.
    Progress(f64),
    /// Terminal value. Always the last event of the sequence.
    Finished(Result<UploadResponse, ApiError>),
}

/// Lazy sequence of upload events, ending with exactly one `Finished`.
///
/// Progress values never decrease. Dropping the receiver does not cancel the
/// request; it only discards further events.
#[derive(Debug)]
pub struct UploadProgress {
    rx: mpsc::UnboundedReceiver<UploadEvent>,
    done: bool,
}

impl UploadProgress {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<UploadEvent>) -> Self {
        Self { rx, done: false }
    }

    /// Next event, or `None` after `Finished` has been returned.
    pub async fn next(&mut self) -> Option<UploadEvent> {
        if self.done {
            return None;
        }
        match self.rx.recv().await {
            Some(event) => {
                if matches!(event, UploadEvent::Finished(_)) {
                    self.done = true;
                }
                Some(event)
            }
            None => {
                self.done = true;
                None
            }
        }
    }

    /// Drain the sequence, calling `on_progress` for every fraction, and
    /// return the final result.
    pub async fn finish(mut self, mut on_progress: impl FnMut(f64)) -> Result<UploadResponse, ApiError> {
        while let Some(event) = self.next().await {
            match event {
                UploadEvent::Progress(fraction) => on_progress(fraction),
                UploadEvent::Finished(result) => return result,
            }
        }
        Err(ApiError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "upload task ended without a result",
        )))
    }
}

/// Shared byte counter for every file part of one multipart request.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    total: u64,
    sent: AtomicU64,
    tx: mpsc::UnboundedSender<UploadEvent>,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64, tx: mpsc::UnboundedSender<UploadEvent>) -> Arc<Self> {
        Arc::new(Self {
            total,
            sent: AtomicU64::new(0),
            tx,
        })
    }

    fn advance(&self, bytes: u64) {
        if bytes == 0 || self.total == 0 {
            return;
        }
        let sent = self.sent.fetch_add(bytes, Ordering::SeqCst) + bytes;
        let fraction = (sent as f64 / self.total as f64).min(1.0);
        let _ = self.tx.send(UploadEvent::Progress(fraction));
    }

    /// Report completion if the byte count has not already reached the total.
    pub(crate) fn complete(&self) {
        let sent = self.sent.swap(self.total, Ordering::SeqCst);
        if sent < self.total || self.total == 0 {
            let _ = self.tx.send(UploadEvent::Progress(1.0));
        }
    }

    pub(crate) fn finish(&self, result: Result<UploadResponse, ApiError>) {
        let _ = self.tx.send(UploadEvent::Finished(result));
    }
}

/// `AsyncRead` adapter that reports every chunk it yields to a tracker.
pub(crate) struct ProgressReader<R> {
    inner: R,
    tracker: Arc<ProgressTracker>,
}

impl<R> ProgressReader<R> {
    pub(crate) fn new(inner: R, tracker: Arc<ProgressTracker>) -> Self {
        Self { inner, tracker }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let read = (buf.filled().len() - before) as u64;
            self.tracker.advance(read);
        }
        poll
    }
}
