//! One-shot delayed task with cancellation.
//!
//! The task sleeps on the Tokio clock and then runs its job exactly once.
//! Cancelling before the delay elapses drops the job without running it;
//! once the job has started it runs to completion. Nothing is persisted, so
//! a task pending when the process exits never runs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    Completed(T),
    Cancelled,
}

/// Cloneable handle that cancels a pending [`DelayedTask`].
#[derive(Debug, Clone)]
pub struct Canceller {
    notify: Arc<Notify>,
}

impl Canceller {
    pub fn cancel(&self) {
        // notify_one stores a permit, so a cancel issued before the task
        // starts waiting is not lost.
        self.notify.notify_one();
    }
}

#[derive(Debug)]
pub struct DelayedTask<T> {
    delay: Duration,
    canceller: Canceller,
    started: Option<oneshot::Receiver<()>>,
    handle: JoinHandle<TaskOutcome<T>>,
}

impl<T: Send + 'static> DelayedTask<T> {
    pub fn schedule<F>(delay: Duration, job: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let notify = Arc::new(Notify::new());
        let cancelled = notify.clone();
        let (started_tx, started) = oneshot::channel();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    debug!(?delay, "Delay elapsed, running scheduled job");
                    // Nobody may be listening.
                    let _ = started_tx.send(());
                    TaskOutcome::Completed(job.await)
                }
                _ = cancelled.notified() => {
                    info!("Scheduled job cancelled before it ran");
                    TaskOutcome::Cancelled
                }
            }
        });

        Self {
            delay,
            canceller: Canceller { notify },
            started: Some(started),
            handle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Resolves with `Ok(())` when the delay has elapsed and the job starts,
    /// or with an error if it was cancelled. Only the first call returns a
    /// receiver.
    pub fn take_started(&mut self) -> Option<oneshot::Receiver<()>> {
        self.started.take()
    }

    /// Wait for the job to run or be cancelled.
    pub async fn join(self) -> Result<TaskOutcome<T>, JoinError> {
        self.handle.await
    }
}

/// Render a delay for people: "60 seconds", "2 minutes", "1 minute 30 seconds".
pub fn describe_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };

    match (secs / 60, secs % 60) {
        (0, s) => plural(s, "second"),
        (m, 0) => plural(m, "minute"),
        (m, s) => format!("{} {}", plural(m, "minute"), plural(s, "second")),
    }
}
