//! Call lifecycle events
//!
//! The executor and the breaker report everything they do through a
//! [`CallObserver`]. Nothing in this crate logs directly; plug in
//! [`TracingObserver`] for structured logs, [`MetricsObserver`] for Prometheus,
//! or both as a tuple.

use crate::circuit_breaker::CircuitState;
use crate::classifier::ErrorClass;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of one transport attempt, kept only for the duration of a call
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub attempt: u32,
    pub elapsed: Duration,
    pub class: Option<ErrorClass>,
    pub error: Option<String>,
}

impl AttemptOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CallEvent<'a> {
    AttemptStarted {
        dependency: &'a str,
        operation: &'a str,
        attempt: u32,
    },
    AttemptFailed {
        dependency: &'a str,
        operation: &'a str,
        outcome: &'a AttemptOutcome,
    },
    CircuitOpened {
        dependency: &'a str,
        consecutive_failures: u32,
        trigger: ErrorClass,
    },
    CircuitHalfOpened {
        dependency: &'a str,
    },
    CircuitClosed {
        dependency: &'a str,
    },
    /// Fast-failed by the breaker without touching the transport
    CallRejected {
        dependency: &'a str,
        operation: &'a str,
        state: CircuitState,
    },
    CallSucceeded {
        dependency: &'a str,
        operation: &'a str,
        attempts: u32,
        elapsed: Duration,
    },
    /// Stopped on a non-retryable error
    CallFailed {
        dependency: &'a str,
        operation: &'a str,
        attempts: u32,
        elapsed: Duration,
        error: &'a str,
    },
    CallExhausted {
        dependency: &'a str,
        operation: &'a str,
        attempts: u32,
        elapsed: Duration,
        error: &'a str,
    },
    CallCanceled {
        dependency: &'a str,
        operation: &'a str,
        attempts: u32,
        elapsed: Duration,
    },
    /// The caller's overall deadline ran out
    CallTimedOut {
        dependency: &'a str,
        operation: &'a str,
        attempts: u32,
        elapsed: Duration,
    },
}

impl CallEvent<'_> {
    /// Stable snake_case name, used as a metric label
    pub fn name(&self) -> &'static str {
        match self {
            Self::AttemptStarted { .. } => "attempt_started",
            Self::AttemptFailed { .. } => "attempt_failed",
            Self::CircuitOpened { .. } => "circuit_opened",
            Self::CircuitHalfOpened { .. } => "circuit_half_opened",
            Self::CircuitClosed { .. } => "circuit_closed",
            Self::CallRejected { .. } => "call_rejected",
            Self::CallSucceeded { .. } => "call_succeeded",
            Self::CallFailed { .. } => "call_failed",
            Self::CallExhausted { .. } => "call_exhausted",
            Self::CallCanceled { .. } => "call_canceled",
            Self::CallTimedOut { .. } => "call_timed_out",
        }
    }

    pub fn dependency(&self) -> &str {
        match self {
            Self::AttemptStarted { dependency, .. }
            | Self::AttemptFailed { dependency, .. }
            | Self::CircuitOpened { dependency, .. }
            | Self::CircuitHalfOpened { dependency }
            | Self::CircuitClosed { dependency }
            | Self::CallRejected { dependency, .. }
            | Self::CallSucceeded { dependency, .. }
            | Self::CallFailed { dependency, .. }
            | Self::CallExhausted { dependency, .. }
            | Self::CallCanceled { dependency, .. }
            | Self::CallTimedOut { dependency, .. } => *dependency,
        }
    }
}

pub trait CallObserver: Send + Sync {
    fn on_event(&self, event: &CallEvent<'_>);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {
    fn on_event(&self, _event: &CallEvent<'_>) {}
}

impl<T: CallObserver + ?Sized> CallObserver for Arc<T> {
    fn on_event(&self, event: &CallEvent<'_>) {
        (**self).on_event(event)
    }
}

impl<A: CallObserver, B: CallObserver> CallObserver for (A, B) {
    fn on_event(&self, event: &CallEvent<'_>) {
        self.0.on_event(event);
        self.1.on_event(event);
    }
}

/// Emits every event as a structured `tracing` record
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn on_event(&self, event: &CallEvent<'_>) {
        match *event {
            CallEvent::AttemptStarted {
                dependency,
                operation,
                attempt,
            } => {
                debug!(dependency, operation, attempt, "Attempt started");
            }
            CallEvent::AttemptFailed {
                dependency,
                operation,
                outcome,
            } => {
                warn!(
                    dependency,
                    operation,
                    attempt = outcome.attempt,
                    class = outcome.class.map(|c| c.as_str()).unwrap_or("none"),
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    error = outcome.error.as_deref().unwrap_or(""),
                    "Attempt failed"
                );
            }
            CallEvent::CircuitOpened {
                dependency,
                consecutive_failures,
                trigger,
            } => {
                warn!(
                    dependency,
                    consecutive_failures,
                    trigger = trigger.as_str(),
                    "Circuit breaker opened"
                );
            }
            CallEvent::CircuitHalfOpened { dependency } => {
                info!(dependency, "Circuit breaker half-open, admitting probe");
            }
            CallEvent::CircuitClosed { dependency } => {
                info!(dependency, "Circuit breaker closed");
            }
            CallEvent::CallRejected {
                dependency,
                operation,
                state,
            } => {
                warn!(dependency, operation, state = ?state, "Circuit breaker rejected call");
            }
            CallEvent::CallSucceeded {
                dependency,
                operation,
                attempts,
                elapsed,
            } => {
                debug!(
                    dependency,
                    operation,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Call succeeded"
                );
            }
            CallEvent::CallFailed {
                dependency,
                operation,
                attempts,
                elapsed,
                error,
            } => {
                error!(
                    dependency,
                    operation,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error,
                    "Non-retryable error"
                );
            }
            CallEvent::CallExhausted {
                dependency,
                operation,
                attempts,
                elapsed,
                error,
            } => {
                error!(
                    dependency,
                    operation,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error,
                    "Call failed after all retries"
                );
            }
            CallEvent::CallCanceled {
                dependency,
                operation,
                attempts,
                elapsed,
            } => {
                debug!(
                    dependency,
                    operation,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Call canceled by caller"
                );
            }
            CallEvent::CallTimedOut {
                dependency,
                operation,
                attempts,
                elapsed,
            } => {
                warn!(
                    dependency,
                    operation,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Call deadline exceeded"
                );
            }
        }
    }
}

/// Test helper: remembers event names in order
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<parking_lot::Mutex<Vec<&'static str>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| **e == name).count()
    }
}

impl CallObserver for RecordingObserver {
    fn on_event(&self, event: &CallEvent<'_>) {
        self.events.lock().push(event.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_observer_fans_out() {
        let first = RecordingObserver::new();
        let second = RecordingObserver::new();
        let both = (first.clone(), second.clone());

        both.on_event(&CallEvent::CircuitClosed { dependency: "listings" });

        assert_eq!(first.events(), vec!["circuit_closed"]);
        assert_eq!(second.events(), vec!["circuit_closed"]);
    }

    #[test]
    fn test_event_accessors() {
        let outcome = AttemptOutcome {
            attempt: 2,
            elapsed: Duration::from_millis(12),
            class: Some(ErrorClass::Retryable),
            error: Some("unavailable".to_string()),
        };
        let event = CallEvent::AttemptFailed {
            dependency: "listings",
            operation: "GetProduct",
            outcome: &outcome,
        };

        assert_eq!(event.name(), "attempt_failed");
        assert_eq!(event.dependency(), "listings");
        assert!(!outcome.succeeded());

        // Must not panic on any variant
        TracingObserver.on_event(&event);
        NoopObserver.on_event(&event);
    }
}
