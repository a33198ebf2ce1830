//! Scoped acquisition of resources that need an async release step.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

/// A resource with an async release step (connection teardown, token
/// cache purge). `close` must be idempotent.
#[async_trait::async_trait]
pub trait AsyncClose: Send + Sync {
    async fn close(&self);
}

/// Run `body` with `resource`, then close the resource.
///
/// `close` runs whether the body returns `Ok`, returns `Err`, or panics. A
/// panic is resumed after the release.
pub async fn scoped<R, T, E, F, Fut>(resource: Arc<R>, body: F) -> Result<T, E>
where
    R: AsyncClose + ?Sized,
    F: FnOnce(Arc<R>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let outcome = AssertUnwindSafe(body(Arc::clone(&resource)))
        .catch_unwind()
        .await;
    resource.close().await;
    tracing::debug!("scoped resource released");
    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
