//! Cancel-and-reschedule debouncing of async work.
//!
//! A [`Debouncer`] holds at most one task. Scheduling a new one aborts the
//! previous task whether it is still sleeping or already running, so a
//! superseded piece of work never starts and an in-flight one stops at its next
//! suspension point.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Default delay between the last input change and the search query.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    task: Option<JoinHandle<()>>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay, task: None }
    }

    /// Aborts the current task and runs `work` after the delay.
    pub fn schedule<F>(&mut self, runtime: &Handle, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let delay = self.delay;
        self.task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        }));
    }

    /// Aborts the current task, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                tracing::debug!("cancelling debounced task");
            }
            task.abort();
        }
    }

    /// Returns `true` while a scheduled task is sleeping or running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn only_the_last_scheduled_task_runs() {
        let runtime = Handle::current();
        let ran = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for word in ["c", "co", "cof"] {
            let ran = Arc::clone(&ran);
            debouncer.schedule(&runtime, async move {
                ran.lock().unwrap().push(word);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*ran.lock().unwrap(), ["cof"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_execution() {
        let runtime = Handle::current();
        let ran = Arc::new(Mutex::new(false));
        let mut debouncer = Debouncer::default();

        let flag = Arc::clone(&ran);
        debouncer.schedule(&runtime, async move {
            *flag.lock().unwrap() = true;
        });
        assert!(debouncer.is_pending());

        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!*ran.lock().unwrap());
    }
}
