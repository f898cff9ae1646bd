/// Caller-facing errors of the listings client
use resilience::{classify_code, AttemptError, CallError};
use tonic::{Code, Status};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingsError {
    /// Rejected locally or by the service as malformed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Circuit open or the service reported itself unavailable
    #[error("listings service unavailable")]
    ServiceUnavailable,

    #[error("listings call timed out")]
    Timeout,

    #[error("listings call canceled")]
    Canceled,

    /// Any other gRPC failure; `attempts` is set when retries ran out
    #[error("listings upstream error ({code:?}): {message}")]
    Upstream {
        code: Code,
        message: String,
        attempts: Option<u32>,
    },
}

impl ListingsError {
    /// Whether a later call may succeed where this one failed
    pub fn is_retryable_upstream(&self) -> bool {
        match self {
            Self::ServiceUnavailable | Self::Timeout => true,
            Self::Upstream { code, .. } => classify_code(*code).is_retryable(),
            _ => false,
        }
    }

    /// Suggested HTTP status for API handlers
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::NotFound(_) => 404,
            Self::ServiceUnavailable => 503,
            Self::Timeout => 504,
            Self::Canceled => 499,
            Self::Upstream { code, .. } => match code {
                Code::Unauthenticated => 401,
                Code::PermissionDenied => 403,
                Code::AlreadyExists | Code::FailedPrecondition | Code::Aborted => 409,
                Code::ResourceExhausted => 429,
                _ => 502,
            },
        }
    }

    fn from_status(status: &Status, attempts: Option<u32>) -> Self {
        match status.code() {
            Code::InvalidArgument | Code::OutOfRange => {
                Self::InvalidArgument(status.message().to_string())
            }
            Code::NotFound => Self::NotFound(status.message().to_string()),
            Code::Unavailable => Self::ServiceUnavailable,
            Code::DeadlineExceeded => Self::Timeout,
            Code::Cancelled => Self::Canceled,
            code => Self::Upstream {
                code,
                message: status.message().to_string(),
                attempts,
            },
        }
    }
}

impl From<Status> for ListingsError {
    fn from(status: Status) -> Self {
        Self::from_status(&status, None)
    }
}

impl From<CallError<Status>> for ListingsError {
    fn from(err: CallError<Status>) -> Self {
        match err {
            CallError::ServiceUnavailable { .. } => Self::ServiceUnavailable,
            CallError::Timeout { .. } => Self::Timeout,
            CallError::Canceled { .. } => Self::Canceled,
            CallError::NonRetryable(status) => Self::from_status(&status, Some(1)),
            CallError::ExhaustedRetries { last, attempts } => match last {
                AttemptError::Transport(status) => Self::from_status(&status, Some(attempts)),
                AttemptError::TimedOut(_) => Self::Timeout,
            },
        }
    }
}
