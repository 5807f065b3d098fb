// Control plane: operation serialization and re-entrancy protection
//
// Every router operation runs to completion before the next one starts,
// and a collaborator calling back into a router that is already mid-operation
// on the same task is turned away instead of deadlocking.
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

static NEXT_GUARD_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    // ids of the guards whose operations are in flight on this task
    static ACTIVE: Vec<u64>;
}

#[derive(Clone)]
pub struct ExecutionGuard {
    id: u64,
    lock: Arc<Mutex<()>>,
}

impl Default for ExecutionGuard {
    fn default() -> Self {
        Self {
            id: NEXT_GUARD_ID.fetch_add(1, Ordering::Relaxed),
            lock: Arc::new(Mutex::new(())),
        }
    }
}

impl ExecutionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an operation guarded by `self` is running on the current task.
    pub fn is_entered(&self) -> bool {
        ACTIVE
            .try_with(|active| active.contains(&self.id))
            .unwrap_or(false)
    }

    /// Run `fut` exclusively. Operations from other tasks queue behind the
    /// current one; a nested call from the same task fails with `Reentrancy`.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, RouterError>
    where
        F: Future,
    {
        let mut active = ACTIVE.try_with(Clone::clone).unwrap_or_default();
        if active.contains(&self.id) {
            warn!(guard = self.id, "re-entrant router call rejected");
            return Err(RouterError::Reentrancy);
        }
        active.push(self.id);

        let _permit = self.lock.lock().await;
        Ok(ACTIVE.scope(active, fut).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn nested_run_on_same_task_is_rejected() {
        let guard = ExecutionGuard::new();
        let inner = guard.clone();
        let out = guard
            .run(async move {
                assert!(inner.is_entered());
                inner.run(async { 1 }).await
            })
            .await
            .unwrap();
        assert!(matches!(out, Err(RouterError::Reentrancy)));
        assert!(!guard.is_entered());
    }

    #[tokio::test]
    async fn distinct_guards_may_nest() {
        let a = ExecutionGuard::new();
        let b = ExecutionGuard::new();
        let out = a.run(async { b.run(async { 7 }).await }).await.unwrap();
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test]
    async fn concurrent_runs_are_serialized() {
        let guard = ExecutionGuard::new();
        let counter = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..4u32 {
            let guard = guard.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                guard
                    .run(async move {
                        counter.lock().await.push(("start", i));
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        counter.lock().await.push(("end", i));
                    })
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let events = counter.lock().await;
        for pair in events.chunks(2) {
            assert_eq!(pair[0].0, "start");
            assert_eq!(pair[1].0, "end");
            assert_eq!(pair[0].1, pair[1].1);
        }
    }
}
