//! Standalone timeout helper for work that does not go through the executor,
//! such as establishing a channel

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error("operation timed out after {0:?}")]
    Elapsed(Duration),
    #[error("operation failed: {0}")]
    Failed(E),
}

impl<E> TimeoutError<E> {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed(_))
    }
}

/// Run a fallible `future` for at most `duration`, keeping its error
pub async fn with_timeout_result<F, T, E>(
    duration: Duration,
    future: F,
) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(duration, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(TimeoutError::Failed(e)),
        Err(_) => Err(TimeoutError::Elapsed(duration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fast_work_completes() {
        let value = with_timeout_result(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, &str>("pong")
        })
        .await;

        assert_eq!(value.ok(), Some("pong"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_work_reports_budget() {
        let budget = Duration::from_millis(250);
        let err = with_timeout_result(budget, std::future::pending::<Result<(), &str>>())
            .await
            .unwrap_err();

        assert!(err.is_elapsed());
        assert!(matches!(err, TimeoutError::Elapsed(d) if d == budget));
    }

    #[tokio::test]
    async fn test_inner_failure_is_not_a_timeout() {
        let outcome = with_timeout_result(Duration::from_secs(5), async {
            Err::<(), _>("tls handshake rejected")
        })
        .await;

        let err = outcome.unwrap_err();
        assert!(!err.is_elapsed());
        assert!(matches!(err, TimeoutError::Failed("tls handshake rejected")));
    }
}
