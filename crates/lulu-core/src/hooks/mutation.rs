use std::future::Future;

use tokio::sync::watch;
use tracing::warn;

use crate::api::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationState {
    pub loading: bool,
    pub error: Option<String>,
}

type SuccessCallback<'a, T> = Box<dyn FnOnce(&T) + Send + 'a>;
type ErrorCallback<'a> = Box<dyn FnOnce(&str) + Send + 'a>;

/// Optional callbacks for a single [`Mutation::mutate`] call.
pub struct MutationCallbacks<'a, T> {
    on_success: Option<SuccessCallback<'a, T>>,
    on_error: Option<ErrorCallback<'a>>,
}

impl<T> Default for MutationCallbacks<'_, T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<'a, T> MutationCallbacks<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the result before `mutate` returns it
    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'a) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Called with the display message before `mutate` returns the error
    pub fn on_error(mut self, f: impl FnOnce(&str) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

/// Internal state: the published state plus the number of calls in flight.
#[derive(Default)]
struct Tracked {
    state: MutationState,
    in_flight: usize,
}

/// Trigger-on-demand write operation with loading/error tracking.
pub struct Mutation {
    tx: watch::Sender<Tracked>,
}

impl Default for Mutation {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutation {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Tracked::default());
        Self { tx }
    }

    pub fn state(&self) -> MutationState {
        self.tx.borrow().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.tx.borrow().state.loading
    }

    /// Run `producer` and return its result.
    ///
    /// On failure the error message is recorded, passed to the error
    /// callback, and the original error is returned to the caller. `loading`
    /// goes back to false on every exit path, including cancellation.
    pub async fn mutate<T, F, Fut>(
        &self,
        producer: F,
        callbacks: MutationCallbacks<'_, T>,
    ) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.tx.send_modify(|tracked| {
            tracked.in_flight += 1;
            tracked.state.loading = true;
            tracked.state.error = None;
        });
        let _reset = LoadingReset { tx: &self.tx };

        match producer().await {
            Ok(result) => {
                if let Some(on_success) = callbacks.on_success {
                    on_success(&result);
                }
                Ok(result)
            }
            Err(e) => {
                let message = e.user_message();
                warn!(error = %e, "Mutation failed");
                self.tx
                    .send_modify(|tracked| tracked.state.error = Some(message.clone()));
                if let Some(on_error) = callbacks.on_error {
                    on_error(&message);
                }
                Err(e)
            }
        }
    }
}

/// Clears `loading` when the last in-flight call ends.
struct LoadingReset<'a> {
    tx: &'a watch::Sender<Tracked>,
}

impl Drop for LoadingReset<'_> {
    fn drop(&mut self) {
        self.tx.send_modify(|tracked| {
            tracked.in_flight = tracked.in_flight.saturating_sub(1);
            tracked.state.loading = tracked.in_flight > 0;
        });
    }
}
