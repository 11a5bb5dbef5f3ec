//! Runs several listeners side by side and reports the first one to stop.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;
use crate::server::{ServerError, ServerResult};

/// Identifies a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Plain HTTP file streaming.
    Http,
    /// Connect RPC transfer service.
    Rpc,
}

impl Transport {
    /// Returns the listener name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Rpc => "rpc",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one listener.
#[derive(Debug)]
pub struct TransportResult {
    /// Listener that stopped.
    pub transport: Transport,
    /// `Ok` for a clean stop, the fatal error otherwise.
    pub outcome: ServerResult<()>,
}

/// What happens to the remaining listeners once the first result arrives.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SiblingPolicy {
    /// Leave them running until the process exits.
    #[default]
    Detach,
    /// Abort them.
    Cancel,
}

/// Listener future registered with the supervisor.
pub type ListenerFuture = BoxFuture<'static, ServerResult<()>>;

/// Owns one task per listener and a channel each task reports into
/// exactly once.
#[derive(Debug)]
pub struct TransportSupervisor {
    policy: SiblingPolicy,
    results: mpsc::Receiver<TransportResult>,
    tasks: Vec<(Transport, JoinHandle<()>)>,
}

impl TransportSupervisor {
    /// Spawns every listener on its own task.
    ///
    /// The result channel holds one slot per listener, so no task ever
    /// waits to report.
    pub fn start<I>(policy: SiblingPolicy, listeners: I) -> Self
    where
        I: IntoIterator<Item = (Transport, ListenerFuture)>,
    {
        let listeners: Vec<_> = listeners.into_iter().collect();
        let (sender, results) = mpsc::channel(listeners.len().max(1));

        let tasks = listeners
            .into_iter()
            .map(|(transport, listener)| {
                let sender = sender.clone();
                let task = tokio::spawn(async move {
                    let outcome = run_listener(transport, listener).await;
                    if sender
                        .send(TransportResult { transport, outcome })
                        .await
                        .is_err()
                    {
                        tracing::debug!(
                            target: TRACING_TARGET_SERVER_SHUTDOWN,
                            transport = %transport,
                            "Listener stopped after the supervisor returned"
                        );
                    }
                });

                (transport, task)
            })
            .collect();

        Self {
            policy,
            results,
            tasks,
        }
    }

    /// Waits for the first listener to stop, cleanly or not.
    ///
    /// The remaining listeners are handled according to the sibling policy.
    pub async fn wait(mut self) -> ServerResult<TransportResult> {
        let first = self.results.recv().await.ok_or(ServerError::NoListeners)?;

        let siblings = self
            .tasks
            .into_iter()
            .filter(|(transport, task)| *transport != first.transport && !task.is_finished());

        for (transport, task) in siblings {
            match self.policy {
                SiblingPolicy::Detach => {
                    tracing::debug!(
                        target: TRACING_TARGET_SERVER_SHUTDOWN,
                        transport = %transport,
                        "Leaving listener running"
                    );
                }
                SiblingPolicy::Cancel => {
                    tracing::info!(
                        target: TRACING_TARGET_SERVER_SHUTDOWN,
                        transport = %transport,
                        "Aborting listener"
                    );
                    task.abort();
                }
            }
        }

        Ok(first)
    }
}

/// Drives a listener, turning a panic into a regular error.
async fn run_listener<F>(transport: Transport, listener: F) -> ServerResult<()>
where
    F: Future<Output = ServerResult<()>>,
{
    AssertUnwindSafe(listener)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(ServerError::ListenerPanicked(
                transport,
                panic_message(panic.as_ref()),
            ))
        })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_owned()))
        .unwrap_or_else(|| "unknown panic type".to_owned())
}
