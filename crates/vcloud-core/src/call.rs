// ── Bounded remote calls ──
//
// A single remote call raced against a deadline and the shared
// cancellation token. Retry policy is left to the caller.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub(crate) enum CallOutcome<T> {
    Done(T),
    Failed(vcloud_api::Error),
    TimedOut,
    Cancelled,
}

pub(crate) async fn bounded<T, F>(
    call: F,
    limit: Duration,
    cancel: &CancellationToken,
) -> CallOutcome<T>
where
    F: Future<Output = Result<T, vcloud_api::Error>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => CallOutcome::Cancelled,
        result = tokio::time::timeout(limit, call) => match result {
            Ok(Ok(value)) => CallOutcome::Done(value),
            Ok(Err(err)) => CallOutcome::Failed(err),
            Err(_elapsed) => CallOutcome::TimedOut,
        },
    }
}
