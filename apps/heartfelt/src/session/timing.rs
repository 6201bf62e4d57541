use std::future::Future;
use std::time::Duration;

/// Runs `request` alongside a timer and resolves once BOTH have finished.
///
/// The output is the request's, success or failure alike; a request that fails
/// fast still waits out `min`. Nothing is cancelled.
pub async fn join_min_duration<F: Future>(request: F, min: Duration) -> F::Output {
    let (output, ()) = tokio::join!(request, tokio::time::sleep(min));
    output
}
