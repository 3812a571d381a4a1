//! Soft deadlines for calls that must not hold up a response.
//!
//! [`within`] spawns the call and waits at most `limit` for it. If the
//! deadline passes first the caller moves on and the spawned task keeps
//! running to completion in the background; its result is discarded.

use std::future::Future;
use std::time::Duration;

/// How a deadline-bounded call ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Deadline<T> {
    /// The call finished in time.
    Settled(T),
    /// The deadline passed first.
    Elapsed,
    /// The call panicked or was cancelled.
    Aborted,
}

impl<T> Deadline<T> {
    /// The settled value, if any.
    pub fn settled(self) -> Option<T> {
        match self {
            Self::Settled(value) => Some(value),
            Self::Elapsed | Self::Aborted => None,
        }
    }
}

/// Run `fut` with a soft deadline of `limit`.
///
/// Must be called from within a tokio runtime.
pub async fn within<F>(limit: Duration, fut: F) -> Deadline<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(fut);
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(value)) => Deadline::Settled(value),
        Ok(Err(join_error)) => {
            tracing::error!(error = %join_error, "deadline-bounded task failed");
            Deadline::Aborted
        }
        Err(_) => Deadline::Elapsed,
    }
}
