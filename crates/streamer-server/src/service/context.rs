//! Per-request deadline and cancellation.

use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Why a request-scoped operation stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    /// The request deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    /// The request was cancelled, typically by the client going away.
    #[error("request cancelled")]
    Cancelled,
}

impl From<Interrupted> for io::Error {
    fn from(interrupted: Interrupted) -> Self {
        let kind = match interrupted {
            Interrupted::DeadlineExceeded => io::ErrorKind::TimedOut,
            Interrupted::Cancelled => io::ErrorKind::Interrupted,
        };

        io::Error::new(kind, interrupted)
    }
}

/// Deadline and cancellation signal scoped to a single request.
///
/// A fresh context is created for every inbound request and handed down
/// explicitly to storage calls and body streams. Nothing in it is shared
/// between requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    deadline: Instant,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Creates a context that expires `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        Self::with_cancellation(timeout, CancellationToken::new())
    }

    /// Creates a context bound to an existing cancellation token.
    pub fn with_cancellation(timeout: Duration, cancellation: CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            cancellation,
        }
    }

    /// Returns the instant after which the request is abandoned.
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns the cancellation token of this request.
    #[inline]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancels the request.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Returns `true` once the deadline passed or the request was cancelled.
    pub fn is_done(&self) -> bool {
        self.cancellation.is_cancelled() || Instant::now() >= self.deadline
    }

    /// Drives `future` until it completes, the deadline passes or the
    /// request is cancelled, whichever happens first.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Interrupted> {
        tokio::select! {
            biased;
            () = self.cancellation.cancelled() => Err(Interrupted::Cancelled),
            () = sleep_until(self.deadline) => Err(Interrupted::DeadlineExceeded),
            output = future => Ok(output),
        }
    }

    /// Wraps a body stream so that it ends with an error once the request
    /// is interrupted.
    ///
    /// Dropping the returned stream cancels the request, which is how a
    /// client disconnect propagates to anything else holding the context.
    pub fn guard_stream<S>(
        &self,
        stream: S,
    ) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        let deadline = self.deadline;
        let cancellation = self.cancellation.clone();

        async_stream::stream! {
            let _cancel_on_drop = cancellation.clone().drop_guard();
            let mut stream = stream.boxed();
            let expired = sleep_until(deadline);
            tokio::pin!(expired);

            loop {
                let next = tokio::select! {
                    biased;
                    () = cancellation.cancelled() => Err(Interrupted::Cancelled),
                    () = &mut expired => Err(Interrupted::DeadlineExceeded),
                    chunk = stream.next() => Ok(chunk),
                };

                match next {
                    Ok(Some(chunk)) => yield chunk,
                    Ok(None) => break,
                    Err(interrupted) => {
                        yield Err(interrupted.into());
                        break;
                    }
                }
            }
        }
    }
}
