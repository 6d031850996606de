use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinSet;

/// A group of long-running tasks stopped together.
///
/// Every task gets a `watch::Receiver<bool>` that flips to `true` when
/// [`BackgroundRunner::shutdown`] is called; tasks are expected to drain
/// and return once they see it.
pub struct BackgroundRunner {
    stop: watch::Sender<bool>,
    tasks: JoinSet<&'static str>,
}

impl Default for BackgroundRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundRunner {
    pub fn new() -> Self {
        Self {
            stop: watch::Sender::new(false),
            tasks: JoinSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn spawn<F, Fut>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let fut = task(self.stop.subscribe());
        self.tasks.spawn(async move {
            fut.await;
            name
        });
        tracing::debug!(task = name, running = self.tasks.len(), "background task spawned");
    }

    /// Raise the stop flag and wait until every task has returned.
    pub async fn shutdown(mut self) {
        self.stop.send_replace(true);
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(name) => tracing::debug!(task = name, "background task stopped"),
                Err(e) => tracing::error!(error = %e, "background task panicked or was cancelled"),
            }
        }
    }
}
