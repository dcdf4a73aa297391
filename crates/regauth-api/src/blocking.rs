//! Offloading CPU-bound work from the async runtime
//!
//! Argon2 hashing and verification run on tokio's blocking pool. The task's
//! output, or its failure, always comes back to the caller.

use crate::error::AppError;

/// Run `task` on the blocking pool and wait for its result
///
/// A panicked or cancelled task surfaces as [`AppError::Internal`].
pub async fn run_blocking<F, T>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal(format!("Background task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_task_output() {
        let value = run_blocking(|| 21 * 2).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_propagates_inner_error() {
        let result: Result<Result<(), String>, AppError> =
            run_blocking(|| Err("inner failure".to_string())).await;
        assert_eq!(result.unwrap(), Err("inner failure".to_string()));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let result = run_blocking(|| -> u32 { panic!("boom") }).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
