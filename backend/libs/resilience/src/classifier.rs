//! Error classification
//!
//! Maps a raw transport error onto the decision the executor acts on. Every
//! classifier must be total and side-effect free; the executor never second
//! guesses its verdict.
//!
//! | class            | retried | counts against breaker | opens breaker at once |
//! |------------------|---------|------------------------|-----------------------|
//! | `Retryable`      | yes     | once retries run out   | no                    |
//! | `NonRetryable`   | no      | yes                    | no                    |
//! | `CircuitTrip`    | yes     | every occurrence       | yes                   |
//! | `CallerCanceled` | no      | no                     | no                    |

use std::error::Error as StdError;
use std::io;
use tonic::{Code, Status};

/// Category the executor acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Transient; another attempt may succeed
    Retryable,
    /// Retrying cannot help (bad input, missing entity, forbidden)
    NonRetryable,
    /// The dependency is unusable as a whole; open the breaker immediately
    CircuitTrip,
    /// Canceled for reasons not attributable to the downstream
    CallerCanceled,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retryable => "retryable",
            Self::NonRetryable => "non_retryable",
            Self::CircuitTrip => "circuit_trip",
            Self::CallerCanceled => "caller_canceled",
        }
    }

    /// Whether another attempt is worth making
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable | Self::CircuitTrip)
    }
}

/// A transport error tagged with its class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified<E> {
    Retryable(E),
    NonRetryable(E),
    CircuitTrip(E),
    CallerCanceled(E),
}

impl<E> Classified<E> {
    pub fn new(class: ErrorClass, cause: E) -> Self {
        match class {
            ErrorClass::Retryable => Self::Retryable(cause),
            ErrorClass::NonRetryable => Self::NonRetryable(cause),
            ErrorClass::CircuitTrip => Self::CircuitTrip(cause),
            ErrorClass::CallerCanceled => Self::CallerCanceled(cause),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Retryable(_) => ErrorClass::Retryable,
            Self::NonRetryable(_) => ErrorClass::NonRetryable,
            Self::CircuitTrip(_) => ErrorClass::CircuitTrip,
            Self::CallerCanceled(_) => ErrorClass::CallerCanceled,
        }
    }

    pub fn cause(&self) -> &E {
        match self {
            Self::Retryable(e) | Self::NonRetryable(e) | Self::CircuitTrip(e) | Self::CallerCanceled(e) => e,
        }
    }

    pub fn into_cause(self) -> E {
        match self {
            Self::Retryable(e) | Self::NonRetryable(e) | Self::CircuitTrip(e) | Self::CallerCanceled(e) => e,
        }
    }
}

pub trait ErrorClassifier<E>: Send + Sync {
    fn classify(&self, error: &E) -> ErrorClass;

    fn classify_owned(&self, error: E) -> Classified<E> {
        let class = self.classify(&error);
        Classified::new(class, error)
    }
}

impl<E, F> ErrorClassifier<E> for F
where
    F: Fn(&E) -> ErrorClass + Send + Sync,
{
    fn classify(&self, error: &E) -> ErrorClass {
        self(error)
    }
}

/// Classifier for `tonic::Status`
///
/// An OS-level cause in the status's source chain wins over the status code.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcStatusClassifier;

impl ErrorClassifier<Status> for GrpcStatusClassifier {
    fn classify(&self, status: &Status) -> ErrorClass {
        if let Some(io_err) = find_io_error(status) {
            return classify_io_error(io_err);
        }
        classify_code(status.code())
    }
}

/// Total mapping of gRPC status codes
pub fn classify_code(code: Code) -> ErrorClass {
    match code {
        Code::Ok
        | Code::InvalidArgument
        | Code::NotFound
        | Code::AlreadyExists
        | Code::PermissionDenied
        | Code::FailedPrecondition
        | Code::OutOfRange
        | Code::Unimplemented
        | Code::DataLoss => ErrorClass::NonRetryable,

        Code::Unavailable
        | Code::DeadlineExceeded
        | Code::ResourceExhausted
        | Code::Aborted
        | Code::Internal
        | Code::Unknown => ErrorClass::Retryable,

        // Credentials are shared by every call to the dependency
        Code::Unauthenticated => ErrorClass::CircuitTrip,

        // tonic reports both local cancellation and server-side cancellation as
        // Cancelled; without a way to tell them apart it must not hit the breaker.
        Code::Cancelled => ErrorClass::CallerCanceled,
    }
}

/// Classification of OS-level connection errors
pub fn classify_io_error(err: &io::Error) -> ErrorClass {
    match err.kind() {
        io::ErrorKind::AddrNotAvailable => ErrorClass::CircuitTrip,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::TimedOut
        | io::ErrorKind::Interrupted
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::WouldBlock => ErrorClass::Retryable,
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::InvalidData
        | io::ErrorKind::Unsupported => ErrorClass::NonRetryable,
        _ => ErrorClass::Retryable,
    }
}

fn find_io_error(status: &Status) -> Option<&io::Error> {
    let mut current: Option<&(dyn StdError + 'static)> = status.source();
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        current = err.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_validation_errors_are_not_retried() {
        for code in [
            Code::InvalidArgument,
            Code::NotFound,
            Code::AlreadyExists,
            Code::PermissionDenied,
            Code::FailedPrecondition,
            Code::OutOfRange,
            Code::Unimplemented,
        ] {
            let status = Status::new(code, "nope");
            assert_eq!(GrpcStatusClassifier.classify(&status), ErrorClass::NonRetryable, "{code:?}");
        }
    }

    #[test]
    fn test_transient_errors_are_retried() {
        for code in [
            Code::Unavailable,
            Code::DeadlineExceeded,
            Code::ResourceExhausted,
            Code::Aborted,
            Code::Internal,
            Code::Unknown,
        ] {
            let status = Status::new(code, "try again");
            assert_eq!(GrpcStatusClassifier.classify(&status), ErrorClass::Retryable, "{code:?}");
        }
    }

    #[test]
    fn test_auth_rejection_trips_circuit() {
        let status = Status::unauthenticated("bad service token");
        assert_eq!(GrpcStatusClassifier.classify(&status), ErrorClass::CircuitTrip);
    }

    #[test]
    fn test_cancelled_never_penalizes_dependency() {
        let status = Status::cancelled("client went away");
        let class = GrpcStatusClassifier.classify(&status);
        assert_eq!(class, ErrorClass::CallerCanceled);
        assert!(!class.is_retryable());
    }

    #[test]
    fn test_io_source_overrides_status_code() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let mut status = Status::unknown("transport error");
        status.set_source(Arc::new(refused));
        assert_eq!(GrpcStatusClassifier.classify(&status), ErrorClass::Retryable);

        let unreachable = io::Error::new(io::ErrorKind::AddrNotAvailable, "no route");
        let mut status = Status::unavailable("transport error");
        status.set_source(Arc::new(unreachable));
        assert_eq!(GrpcStatusClassifier.classify(&status), ErrorClass::CircuitTrip);
    }

    #[test]
    fn test_closure_classifier() {
        let classifier = |e: &String| {
            if e.starts_with("retry") {
                ErrorClass::Retryable
            } else {
                ErrorClass::NonRetryable
            }
        };

        assert_eq!(classifier.classify(&"retry me".to_string()), ErrorClass::Retryable);

        let classified = classifier.classify_owned("boom".to_string());
        assert_eq!(classified.class(), ErrorClass::NonRetryable);
        assert_eq!(classified.into_cause(), "boom");
    }
}
