//! Helpers shared by the interactive loop.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Runs `future`, converting a panic into `Err(message)`.
///
/// Background fetches report back through a channel; without this a panic
/// inside one would leave its view stuck in `Loading`.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_value() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_converts_str_panic() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_converts_formatted_panic() {
        let id = 3;
        let result: Result<(), String> =
            catch_task_panic(async move { panic!("article {id} exploded") }).await;
        assert_eq!(result, Err("article 3 exploded".to_string()));
    }
}
