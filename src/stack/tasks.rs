//! Supervised background tasks sharing one cancellation token.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::warn;

use crate::error::{Result, StackwatchError};

/// Error-group over tokio tasks: the first failure cancels the shared token
/// and is what [`TaskGroup::wait`] reports.
#[derive(Clone)]
pub struct TaskGroup {
    tracker: TaskTracker,
    cancel: CancellationToken,
    first_error: Arc<Mutex<Option<StackwatchError>>>,
}

impl TaskGroup {
    /// The group's token is a child of `parent`, so cancelling the parent
    /// cancels the group but a task failure does not escape upward.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            tracker: TaskTracker::new(),
            cancel: parent.child_token(),
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let first_error = Arc::clone(&self.first_error);
        self.tracker.spawn(async move {
            let outcome = AssertUnwindSafe(task)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(StackwatchError::Task(format!("{} panicked", name))));
            if let Err(err) = outcome {
                warn!(task = name, error = %err, "Background task failed");
                let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(err);
                }
                cancel.cancel();
            }
        });
    }

    /// Waits for every spawned task, including ones spawned while waiting,
    /// and returns the first error any of them produced.
    pub async fn wait(&self) -> Result<()> {
        self.tracker.close();
        self.tracker.wait().await;
        let err = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
