//! Cancellation utilities.
//!
//! Provides a first-class cancellation handle threaded through streaming
//! requests. Cancellation is cooperative: the streaming client observes
//! the handle between events and steps and stops as soon as possible.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. Streams observing this handle stop as soon
    /// as possible; dropping a cancelled stream closes the underlying
    /// HTTP connection so the provider stops generating tokens.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
