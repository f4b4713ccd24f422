use std::future::Future;
use std::time::Duration;

/// Race `operation` against `bound`. `None` means the deadline won.
///
/// The losing operation is dropped, which aborts whatever it was awaiting
/// (for an HTTP adapter, the in-flight request).
pub async fn with_timeout<F>(operation: F, bound: Duration) -> Option<F::Output>
where
    F: Future,
{
    tokio::time::timeout(bound, operation).await.ok()
}
