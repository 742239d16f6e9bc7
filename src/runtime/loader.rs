//! Runtime loader
//!
//! Boots the dynamic runtime at most once per attempt no matter how many
//! callers ask for it concurrently. A successful load is kept for the life of
//! the loader; a failed load is reported to every caller that joined it and
//! the next `acquire` starts a fresh attempt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::ExecutionError;
use crate::runtime::bootstrap::RuntimeBootstrap;
use crate::runtime::handle::RuntimeHandle;

type LoadFuture = Shared<BoxFuture<'static, Result<Arc<RuntimeHandle>, String>>>;

enum LoadState {
    Uninitialized,
    Loading { attempt: u64, future: LoadFuture },
    Ready(Arc<RuntimeHandle>),
    Failed { reason: String },
}

/// Observable loader state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

pub struct RuntimeLoader {
    bootstrap: Arc<dyn RuntimeBootstrap>,
    state: Arc<Mutex<LoadState>>,
    attempts: AtomicU64,
}

impl RuntimeLoader {
    pub fn new(bootstrap: Arc<dyn RuntimeBootstrap>) -> Self {
        Self {
            bootstrap,
            state: Arc::new(Mutex::new(LoadState::Uninitialized)),
            attempts: AtomicU64::new(0),
        }
    }

    pub async fn status(&self) -> LoaderStatus {
        match &*self.state.lock().await {
            LoadState::Uninitialized => LoaderStatus::Uninitialized,
            LoadState::Loading { .. } => LoaderStatus::Loading,
            LoadState::Ready(_) => LoaderStatus::Ready,
            LoadState::Failed { reason } => LoaderStatus::Failed(reason.clone()),
        }
    }

    /// Get the runtime, loading it if no load has succeeded yet.
    ///
    /// Callers arriving while a load is in flight wait for that load. The
    /// load runs on its own task, so a caller giving up does not cancel it.
    pub async fn acquire(&self) -> Result<Arc<RuntimeHandle>, ExecutionError> {
        let future = {
            let mut state = self.state.lock().await;
            match &*state {
                LoadState::Ready(handle) => return Ok(Arc::clone(handle)),
                LoadState::Loading { future, .. } => future.clone(),
                LoadState::Uninitialized | LoadState::Failed { .. } => {
                    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    let future = self.start(attempt);
                    *state = LoadState::Loading {
                        attempt,
                        future: future.clone(),
                    };
                    future
                }
            }
        };

        future.await.map_err(ExecutionError::RuntimeUnavailable)
    }

    fn start(&self, attempt: u64) -> LoadFuture {
        let bootstrap = Arc::clone(&self.bootstrap);
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            info!(attempt, "Loading runtime");
            let outcome = match bootstrap.boot().await {
                Ok(handle) => Ok(Arc::new(handle)),
                Err(ExecutionError::RuntimeUnavailable(reason)) => Err(reason),
                Err(e) => Err(e.to_string()),
            };

            let mut guard = state.lock().await;
            if matches!(&*guard, LoadState::Loading { attempt: current, .. } if *current == attempt) {
                *guard = match &outcome {
                    Ok(handle) => {
                        info!(attempt, version = %handle.version(), "Runtime ready");
                        LoadState::Ready(Arc::clone(handle))
                    }
                    Err(reason) => {
                        warn!(attempt, "Runtime load failed: {}", reason);
                        LoadState::Failed {
                            reason: reason.clone(),
                        }
                    }
                };
            }
            outcome
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(format!("runtime load task failed: {}", e)),
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandSpec, RunLimits};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Counts boots; the first `failures` boots fail
    struct CountingBootstrap {
        boots: AtomicUsize,
        failures: usize,
        delay: Duration,
    }

    impl CountingBootstrap {
        fn new(failures: usize, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                boots: AtomicUsize::new(0),
                failures,
                delay,
            })
        }

        fn boots(&self) -> usize {
            self.boots.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RuntimeBootstrap for CountingBootstrap {
        async fn boot(&self) -> Result<RuntimeHandle, ExecutionError> {
            let n = self.boots.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if n < self.failures {
                return Err(ExecutionError::RuntimeUnavailable(format!("boot {} failed", n)));
            }
            Ok(RuntimeHandle::new(
                CommandSpec::new("true"),
                RunLimits::default(),
                "solution",
                "3.12.0",
            ))
        }
    }

    #[tokio::test]
    async fn test_concurrent_acquires_share_one_load() {
        let bootstrap = CountingBootstrap::new(0, Duration::from_millis(50));
        let loader = Arc::new(RuntimeLoader::new(bootstrap.clone()));
        assert_eq!(loader.status().await, LoaderStatus::Uninitialized);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let loader = Arc::clone(&loader);
            tasks.push(tokio::spawn(async move { loader.acquire().await }));
        }

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(bootstrap.boots(), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
        assert_eq!(loader.status().await, LoaderStatus::Ready);

        let again = loader.acquire().await.unwrap();
        assert!(Arc::ptr_eq(&again, &handles[0]));
        assert_eq!(bootstrap.boots(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let bootstrap = CountingBootstrap::new(1, Duration::from_millis(5));
        let loader = RuntimeLoader::new(bootstrap.clone());

        let err = loader.acquire().await.unwrap_err();
        assert!(matches!(err, ExecutionError::RuntimeUnavailable(ref r) if r == "boot 0 failed"));
        assert_eq!(
            loader.status().await,
            LoaderStatus::Failed("boot 0 failed".to_string())
        );

        let handle = loader.acquire().await.unwrap();
        assert_eq!(handle.version(), "3.12.0");
        assert_eq!(bootstrap.boots(), 2);
        assert_eq!(loader.status().await, LoaderStatus::Ready);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_a_failure() {
        let bootstrap = CountingBootstrap::new(1, Duration::from_millis(50));
        let loader = Arc::new(RuntimeLoader::new(bootstrap.clone()));

        let (a, b) = tokio::join!(loader.acquire(), loader.acquire());
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(bootstrap.boots(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_acquire_keeps_loading() {
        let bootstrap = CountingBootstrap::new(0, Duration::from_millis(50));
        let loader = Arc::new(RuntimeLoader::new(bootstrap.clone()));

        let waiter = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.acquire().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(loader.status().await, LoaderStatus::Loading);
        waiter.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(loader.status().await, LoaderStatus::Ready);

        loader.acquire().await.unwrap();
        assert_eq!(bootstrap.boots(), 1);
    }
}
