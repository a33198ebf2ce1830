//! Cancellation token used across agent calls.
//!
//! A clone of a [`CancellationToken`] shares state with the original, so a
//! token handed to an agent is the caller's token: cancelling either side is
//! observed by both.

use std::future::Future;

pub use tokio_util::sync::CancellationToken;

/// Outcome of racing a future against a cancellation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelAware<T> {
    Value(T),
    Cancelled,
}

impl<T> CancelAware<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            CancelAware::Value(v) => Some(v),
            CancelAware::Cancelled => None,
        }
    }
}

/// Await `fut`, giving up as soon as `token` is cancelled.
///
/// A token that is already cancelled wins without polling `fut`.
pub async fn await_or_cancel<T, F>(token: &CancellationToken, fut: F) -> CancelAware<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => CancelAware::Cancelled,
        value = fut => CancelAware::Value(value),
    }
}
