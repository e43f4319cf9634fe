//! Coalesces a burst of triggers into one delayed action per quiet period.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Runs at most one registered action per quiet period.
///
/// Every [`Debouncer::schedule`] call supersedes the previous registration if
/// it has not fired yet. An action that already fired runs to completion even
/// if a later registration or [`Debouncer::cancel`] arrives while it is in
/// flight.
pub struct Debouncer {
    runtime_handle: Handle,
    parent: Option<CancellationToken>,
    pending: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new(runtime_handle: Handle) -> Self {
        Self {
            runtime_handle,
            parent: None,
            pending: None,
        }
    }

    /// Ties every registration to `parent`: cancelling it discards the
    /// pending action exactly like [`Debouncer::cancel`].
    pub fn child_of(runtime_handle: Handle, parent: CancellationToken) -> Self {
        Self {
            runtime_handle,
            parent: Some(parent),
            pending: None,
        }
    }

    pub fn schedule<F, Fut>(&mut self, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        self.pending = Some(token.clone());

        self.runtime_handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => action().await,
            }
        });
    }

    /// Discards the pending action, if any. No side effect otherwise.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
