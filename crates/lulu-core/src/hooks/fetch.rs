use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::api::{ApiError, GENERIC_ERROR_MESSAGE};

/// Boxed zero-argument producer of a backend call
pub type Producer<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// Observable state of a [`Fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    /// Settled with data and no error
    pub fn is_ready(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_some()
    }
}

/// What the watch channel carries: the public state plus the sequence
/// number of the newest load, so a completing load can tell whether it is
/// still the latest under the same lock that publishes its result.
struct Tracked<T> {
    state: FetchState<T>,
    latest: u64,
}

/// Declarative one-shot fetch.
///
/// Runs the producer when mounted and again whenever the dependency value
/// changes or [`refetch`](Fetch::refetch) is called. Only the newest load
/// may publish a result; older ones finishing late are discarded. Dropping
/// the `Fetch` discards whatever is still in flight.
pub struct Fetch<T, D = ()> {
    producer: Producer<T>,
    deps: D,
    tx: Arc<watch::Sender<Tracked<T>>>,
    rx: watch::Receiver<Tracked<T>>,
}

impl<T, D> Fetch<T, D>
where
    T: Clone + Send + Sync + 'static,
    D: PartialEq,
{
    /// Create the fetch and start the first load.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount<F, Fut>(deps: D, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let producer: Producer<T> = Arc::new(move || producer().boxed());
        let (tx, rx) = watch::channel(Tracked {
            state: FetchState::default(),
            latest: 0,
        });
        let fetch = Self {
            producer,
            deps,
            tx: Arc::new(tx),
            rx,
        };
        fetch.start();
        fetch
    }

    /// Replace the dependency value, reloading if it changed.
    pub fn set_deps(&mut self, deps: D) -> Option<JoinHandle<()>> {
        if self.deps == deps {
            return None;
        }
        self.deps = deps;
        Some(self.start())
    }

    /// Swap in a producer built from the latest inputs, reloading only if
    /// `deps` changed. `refetch` always uses the newest producer.
    pub fn update<F, Fut>(&mut self, deps: D, producer: F) -> Option<JoinHandle<()>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.producer = Arc::new(move || producer().boxed());
        self.set_deps(deps)
    }

    pub fn deps(&self) -> &D {
        &self.deps
    }

    /// Run the producer again regardless of dependencies.
    pub fn refetch(&self) -> JoinHandle<()> {
        self.start()
    }

    pub fn state(&self) -> FetchState<T> {
        self.rx.borrow().state.clone()
    }

    /// Changes of the state as they are published.
    pub fn subscribe(&self) -> FetchWatcher<T> {
        FetchWatcher {
            rx: self.tx.subscribe(),
        }
    }

    /// Wait until the current load has finished and return the state.
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so the channel cannot close here
        let state = match rx.wait_for(|tracked| !tracked.state.loading).await {
            Ok(tracked) => tracked.state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    fn start(&self) -> JoinHandle<()> {
        // Flip to loading before the producer runs
        let mut seq = 0;
        self.tx.send_modify(|tracked| {
            tracked.latest += 1;
            seq = tracked.latest;
            tracked.state.loading = true;
            tracked.state.error = None;
        });

        let call = (self.producer)();
        let mut guard = LoadGuard {
            tx: Arc::clone(&self.tx),
            seq,
            finished: false,
        };

        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(call).catch_unwind().await;
            guard.finished = true;
            guard.tx.send_if_modified(|tracked| {
                if tracked.latest != seq {
                    debug!(seq, latest = tracked.latest, "Discarding stale fetch result");
                    return false;
                }
                match outcome {
                    Ok(Ok(data)) => {
                        tracked.state.data = Some(data);
                        tracked.state.error = None;
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Fetch failed");
                        tracked.state.error = Some(e.user_message());
                    }
                    Err(_) => {
                        error!(seq, "Fetch producer panicked");
                        tracked.state.error = Some(GENERIC_ERROR_MESSAGE.to_string());
                    }
                }
                tracked.state.loading = false;
                true
            });
        })
    }
}

/// Ends a load whose task was aborted before it could publish, so
/// `loading` cannot stay stuck.
struct LoadGuard<T> {
    tx: Arc<watch::Sender<Tracked<T>>>,
    seq: u64,
    finished: bool,
}

impl<T> Drop for LoadGuard<T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let seq = self.seq;
        self.tx.send_if_modified(|tracked| {
            if tracked.latest != seq || !tracked.state.loading {
                return false;
            }
            debug!(seq, "Fetch cancelled before completing");
            tracked.state.loading = false;
            true
        });
    }
}

impl<T, D> Drop for Fetch<T, D> {
    fn drop(&mut self) {
        // Invalidate in-flight loads so their results are dropped
        self.tx.send_if_modified(|tracked| {
            tracked.latest += 1;
            false
        });
    }
}

/// Read-only view of a [`Fetch`]'s state for another task.
pub struct FetchWatcher<T> {
    rx: watch::Receiver<Tracked<T>>,
}

impl<T: Clone> FetchWatcher<T> {
    pub fn current(&self) -> FetchState<T> {
        self.rx.borrow().state.clone()
    }

    /// Wait for the next published state. Returns `None` once the `Fetch`
    /// has been dropped.
    pub async fn changed(&mut self) -> Option<FetchState<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().state.clone())
    }
}
