//! Cancellable delayed tasks, at most one per key.
//!
//! Scheduling a task under a key that already has one aborts the older task.
//! Finished tasks remove themselves, unless they were already replaced.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::AbortHandle;
use tracing::debug;

use governdao_types::ProposalId;

/// What a scheduled task reconciles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Re-read of one proposal after a vote.
    Proposal(ProposalId),
    /// Full reload after a proposal was created.
    Reload,
}

struct Scheduled {
    generation: u64,
    handle: AbortHandle,
}

type TaskTable = Arc<Mutex<HashMap<TaskKey, Scheduled>>>;

#[derive(Default)]
pub struct ReconcileScheduler {
    tasks: TaskTable,
    next_generation: AtomicU64,
}

impl ReconcileScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` under `key`, aborting whatever was scheduled there before.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: TaskKey, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let table = Arc::clone(&self.tasks);
        let own_key = key.clone();

        // Held across spawn so the task cannot finish before it is registered.
        let Ok(mut tasks) = self.tasks.lock() else {
            return;
        };
        let handle = tokio::spawn(async move {
            task.await;
            if let Ok(mut tasks) = table.lock() {
                if tasks.get(&own_key).map(|s| s.generation) == Some(generation) {
                    tasks.remove(&own_key);
                }
            }
        });
        let previous = tasks.insert(
            key.clone(),
            Scheduled {
                generation,
                handle: handle.abort_handle(),
            },
        );
        if let Some(previous) = previous {
            debug!(?key, "superseding scheduled reconciliation");
            previous.handle.abort();
        }
    }

    /// Abort the task scheduled under `key`, if any.
    pub fn cancel(&self, key: &TaskKey) -> bool {
        let Ok(mut tasks) = self.tasks.lock() else {
            return false;
        };
        match tasks.remove(key) {
            Some(scheduled) => {
                scheduled.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending per-proposal re-read. Returns how many were aborted.
    pub fn cancel_proposal_reads(&self) -> usize {
        let Ok(mut tasks) = self.tasks.lock() else {
            return 0;
        };
        let before = tasks.len();
        tasks.retain(|key, scheduled| {
            let keep = !matches!(key, TaskKey::Proposal(_));
            if !keep {
                scheduled.handle.abort();
            }
            keep
        });
        before - tasks.len()
    }

    pub fn is_scheduled(&self, key: &TaskKey) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.contains_key(key))
            .unwrap_or(false)
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().map(|tasks| tasks.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_task(counter: &Arc<AtomicUsize>, delay_ms: u64) -> impl Future<Output = ()> {
        let counter = Arc::clone(counter);
        async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn finished_task_unregisters_itself() {
        let scheduler = ReconcileScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let key = TaskKey::Proposal(ProposalId::new("1"));

        scheduler.schedule(key.clone(), counting_task(&counter, 10));
        assert!(scheduler.is_scheduled(&key));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_scheduled(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_a_key_aborts_the_older_task() {
        let scheduler = ReconcileScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let key = TaskKey::Proposal(ProposalId::new("1"));

        scheduler.schedule(key.clone(), counting_task(&counter, 10));
        scheduler.schedule(key.clone(), counting_task(&counter, 10));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_proposal_reads_keeps_reload() {
        let scheduler = ReconcileScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(TaskKey::Proposal(ProposalId::new("1")), counting_task(&counter, 10));
        scheduler.schedule(TaskKey::Proposal(ProposalId::new("2")), counting_task(&counter, 10));
        scheduler.schedule(TaskKey::Reload, counting_task(&counter, 10));

        assert_eq!(scheduler.cancel_proposal_reads(), 2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_by_key() {
        let scheduler = ReconcileScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(TaskKey::Reload, counting_task(&counter, 10));
        assert!(scheduler.cancel(&TaskKey::Reload));
        assert!(!scheduler.cancel(&TaskKey::Reload));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
