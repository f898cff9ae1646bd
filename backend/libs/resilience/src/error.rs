/// Error taxonomy surfaced by the resilient executor
use std::time::Duration;

/// Failure of a single attempt
#[derive(Debug, thiserror::Error)]
pub enum AttemptError<E> {
    /// The transport returned an error
    #[error("{0}")]
    Transport(E),
    /// The attempt did not finish within its per-attempt timeout
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
}

impl<E> AttemptError<E> {
    /// Underlying transport error, if the attempt reached the transport's verdict
    pub fn transport(&self) -> Option<&E> {
        match self {
            Self::Transport(e) => Some(e),
            Self::TimedOut(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

/// Outcome of [`ResilientExecutor::execute`](crate::ResilientExecutor::execute)
/// when no response could be produced.
///
/// Callers map these kinds onto their own protocol (for example HTTP 503 for
/// `ServiceUnavailable`).
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    /// Circuit is open or a probe is already in flight; no attempt was made
    #[error("{dependency} is unavailable (circuit open)")]
    ServiceUnavailable { dependency: String },

    /// The caller's overall deadline passed
    #[error("call deadline exceeded after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// The downstream rejected the request in a way retrying cannot fix
    #[error("non-retryable failure: {0}")]
    NonRetryable(E),

    /// Every permitted attempt failed with a retryable error
    #[error("failed after {attempts} attempts: {last}")]
    ExhaustedRetries { last: AttemptError<E>, attempts: u32 },

    /// The caller canceled the call; `last` is the failure of the attempt
    /// before the cancellation, if there was one
    #[error("call canceled by caller after {attempts} attempts")]
    Canceled {
        last: Option<AttemptError<E>>,
        attempts: u32,
    },
}

impl<E> CallError<E> {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }

    /// True for the overall deadline and for retries exhausted by per-attempt timeouts
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::ExhaustedRetries { last, .. } => last.is_timeout(),
            _ => false,
        }
    }

    /// Number of transport attempts made before the error was produced, when known
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::ServiceUnavailable { .. } => Some(0),
            Self::ExhaustedRetries { attempts, .. } | Self::Canceled { attempts, .. } => {
                Some(*attempts)
            }
            _ => None,
        }
    }

    /// The last transport error, if any attempt got one back
    pub fn cause(&self) -> Option<&E> {
        match self {
            Self::NonRetryable(e) => Some(e),
            Self::ExhaustedRetries { last, .. } => last.transport(),
            Self::Canceled { last, .. } => last.as_ref().and_then(AttemptError::transport),
            _ => None,
        }
    }
}

/// Invalid resilience configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("backoff multiplier must be a finite value >= 1.0, got {0}")]
    InvalidMultiplier(f64),
    #[error("initial backoff {initial:?} exceeds max backoff {max:?}")]
    BackoffOrder { initial: Duration, max: Duration },
    #[error("failure_threshold must be at least 1")]
    ZeroFailureThreshold,
    #[error("{0} timeout must be non-zero")]
    ZeroTimeout(&'static str),
}
