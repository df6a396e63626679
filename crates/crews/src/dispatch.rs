use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, warn};

use crate::error::CrewError;

/// A background task that returned an error.
#[derive(Debug)]
pub struct TaskFailure {
    pub task: &'static str,
    pub error: CrewError,
}

/// Fire-and-forget task runner. Handlers never await what they spawn; failures land
/// on the receiver returned by [`Dispatcher::new`].
#[derive(Clone)]
pub struct Dispatcher {
    failures: mpsc::UnboundedSender<TaskFailure>,
    inflight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Dispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TaskFailure>) {
        let (failures, failures_rx) = mpsc::unbounded_channel();
        (
            Self {
                failures,
                inflight: Arc::new(Mutex::new(Vec::new())),
            },
            failures_rx,
        )
    }

    pub fn spawn<F>(&self, task: &'static str, future: F)
    where
        F: Future<Output = Result<(), CrewError>> + Send + 'static,
    {
        let failures = self.failures.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = future.await {
                error!(task, error = %err, "crews: background task failed");
                let _ = failures.send(TaskFailure { task, error: err });
            }
        });

        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        inflight.retain(|handle| !handle.is_finished());
        inflight.push(handle);
    }

    /// Waits until every task spawned so far (including ones spawned while
    /// waiting) has finished.
    pub async fn settle(&self) {
        loop {
            let pending = {
                let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *inflight)
            };
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(err) = handle.await {
                    warn!(error = %err, "crews: background task did not complete");
                }
            }
        }
    }
}
