use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Runs a future, turning a panic inside it into `Err(panic message)`.
///
/// Background tasks use this so a panic surfaces as a row failure or a
/// status message instead of a task that silently disappears.
pub async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            }
        })
}
