//! Completion tracking for log dispatch
//!
//! Every log call returns a [`Completion`] describing when the record has
//! fully reached its sinks. Synchronous handlers resolve immediately;
//! queue-backed handlers resolve from their worker thread through a
//! [`CompletionSender`]. A propagation sweep joins the completions of every
//! handler it touched into one.

use super::error::{LogError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// The outcome of one log dispatch, possibly still in flight.
#[derive(Debug)]
pub struct Completion {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Ready(Result<()>),
    Pending {
        rx: Receiver<Result<()>>,
        timeout: Option<Duration>,
    },
    Join(Vec<Completion>),
}

impl Completion {
    /// An already-successful completion. Used by the fast paths: disabled
    /// levels, rejected records, handlers with nothing to wait for.
    pub fn done() -> Self {
        Self {
            inner: Inner::Ready(Ok(())),
        }
    }

    /// An already-failed completion.
    pub fn failed(error: LogError) -> Self {
        Self {
            inner: Inner::Ready(Err(error)),
        }
    }

    /// A completion resolved later by its paired sender.
    ///
    /// Dropping the sender without resolving yields [`LogError::Incomplete`]
    /// to any waiter, so an abandoned dispatch never hangs forever.
    pub fn deferred() -> (Self, CompletionSender) {
        let (tx, rx) = bounded(1);
        (
            Self {
                inner: Inner::Pending { rx, timeout: None },
            },
            CompletionSender { tx },
        )
    }

    /// Aggregate several completions into one that resolves when all do.
    pub fn join(mut completions: Vec<Completion>) -> Self {
        match completions.len() {
            0 => Self::done(),
            1 => completions.remove(0),
            _ => Self {
                inner: Inner::Join(completions),
            },
        }
    }

    /// Bound the time a waiter will block on this completion.
    ///
    /// Only affects pending completions; resolved ones are unchanged.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match &mut self.inner {
            Inner::Pending { timeout: slot, .. } => *slot = Some(timeout),
            Inner::Join(parts) => {
                let parts = std::mem::take(parts);
                self.inner = Inner::Join(
                    parts
                        .into_iter()
                        .map(|c| c.with_timeout(timeout))
                        .collect(),
                );
            }
            Inner::Ready(_) => {}
        }
        self
    }

    /// Whether the completion has already resolved without blocking.
    pub fn is_ready(&self) -> bool {
        match &self.inner {
            Inner::Ready(_) => true,
            Inner::Pending { .. } => false,
            Inner::Join(parts) => parts.iter().all(Completion::is_ready),
        }
    }

    /// Block until resolution.
    ///
    /// Joined completions wait on every branch and fold the failures: none
    /// means success, one is returned as-is, several become an aggregate.
    pub fn wait(self) -> Result<()> {
        match self.inner {
            Inner::Ready(result) => result,
            Inner::Pending { rx, timeout } => wait_receiver(&rx, timeout),
            Inner::Join(parts) => {
                let mut errors = Vec::new();
                for part in parts {
                    if let Err(e) = part.wait() {
                        errors.push(e);
                    }
                }
                match LogError::aggregate(errors) {
                    None => Ok(()),
                    Some(e) => Err(e),
                }
            }
        }
    }

    /// Block at most `timeout`, overriding any per-completion bound.
    pub fn wait_timeout(self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        self.wait_until(deadline)
    }

    fn wait_until(self, deadline: Instant) -> Result<()> {
        match self.inner {
            Inner::Ready(result) => result,
            Inner::Pending { rx, .. } => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                wait_receiver(&rx, Some(remaining))
            }
            Inner::Join(parts) => {
                let mut errors = Vec::new();
                for part in parts {
                    if let Err(e) = part.wait_until(deadline) {
                        errors.push(e);
                    }
                }
                match LogError::aggregate(errors) {
                    None => Ok(()),
                    Some(e) => Err(e),
                }
            }
        }
    }

    /// Invoke a callback with the outcome once resolved.
    ///
    /// Runs inline when the completion is already resolved; otherwise a
    /// waiter thread delivers the outcome. This is the bridge for callers
    /// that want notification instead of blocking.
    pub fn on_complete(self, callback: impl FnOnce(Result<()>) + Send + 'static) {
        if self.is_ready() {
            callback(self.wait());
            return;
        }
        std::thread::Builder::new()
            .name("hierlog-completion".to_string())
            .spawn(move || callback(self.wait()))
            .ok();
    }
}

fn wait_receiver(rx: &Receiver<Result<()>>, timeout: Option<Duration>) -> Result<()> {
    match timeout {
        None => rx.recv().unwrap_or(Err(LogError::Incomplete)),
        Some(timeout) => match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(LogError::EmitTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(LogError::Incomplete),
        },
    }
}

/// Resolves a paired deferred [`Completion`]. Only the first resolution
/// counts; later calls are ignored.
#[derive(Debug, Clone)]
pub struct CompletionSender {
    tx: Sender<Result<()>>,
}

impl CompletionSender {
    pub fn resolve(&self, result: Result<()>) {
        let _ = self.tx.try_send(result);
    }

    pub fn succeed(&self) {
        self.resolve(Ok(()));
    }

    pub fn fail(&self, error: LogError) {
        self.resolve(Err(error));
    }
}
