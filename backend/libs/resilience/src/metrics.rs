/// Prometheus metrics for resilient calls
///
/// [`MetricsObserver`] turns [`CallEvent`]s into counters and histograms. With
/// the `metrics` feature disabled it compiles to a no-op.
use crate::observer::{CallEvent, CallObserver};

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

#[cfg(feature = "metrics")]
static CIRCUIT_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "resilience_circuit_transitions_total",
        "Circuit breaker state transitions",
        &["dependency", "to"]
    )
    .expect("Failed to register circuit transitions metric")
});

#[cfg(feature = "metrics")]
static CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "resilience_calls_total",
        "Resilient calls by final outcome",
        &["dependency", "operation", "outcome"]
    )
    .expect("Failed to register calls metric")
});

#[cfg(feature = "metrics")]
static ATTEMPT_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "resilience_attempt_failures_total",
        "Failed transport attempts by error class",
        &["dependency", "operation", "class"]
    )
    .expect("Failed to register attempt failures metric")
});

#[cfg(feature = "metrics")]
static CALL_ATTEMPTS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "resilience_call_attempts",
        "Attempts made per call before it finished",
        &["dependency", "outcome"],
        vec![1.0, 2.0, 3.0, 5.0, 10.0]
    )
    .expect("Failed to register call attempts metric")
});

#[cfg(feature = "metrics")]
static CALL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "resilience_call_duration_seconds",
        "End-to-end duration of resilient calls, backoff included",
        &["dependency", "operation", "outcome"]
    )
    .expect("Failed to register call duration metric")
});

/// Records every call event into the process-wide Prometheus registry
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

#[cfg(feature = "metrics")]
impl CallObserver for MetricsObserver {
    fn on_event(&self, event: &CallEvent<'_>) {
        match *event {
            CallEvent::AttemptStarted { .. } => {}
            CallEvent::AttemptFailed {
                dependency,
                operation,
                outcome,
            } => {
                let class = outcome.class.map(|c| c.as_str()).unwrap_or("unknown");
                ATTEMPT_FAILURES
                    .with_label_values(&[dependency, operation, class])
                    .inc();
            }
            CallEvent::CircuitOpened { dependency, .. } => {
                CIRCUIT_TRANSITIONS.with_label_values(&[dependency, "open"]).inc();
            }
            CallEvent::CircuitHalfOpened { dependency } => {
                CIRCUIT_TRANSITIONS
                    .with_label_values(&[dependency, "half_open"])
                    .inc();
            }
            CallEvent::CircuitClosed { dependency } => {
                CIRCUIT_TRANSITIONS.with_label_values(&[dependency, "closed"]).inc();
            }
            CallEvent::CallRejected {
                dependency,
                operation,
                ..
            } => {
                CALLS
                    .with_label_values(&[dependency, operation, "rejected"])
                    .inc();
            }
            CallEvent::CallSucceeded {
                dependency,
                operation,
                attempts,
                elapsed,
            } => record_call(dependency, operation, "success", attempts, elapsed),
            CallEvent::CallFailed {
                dependency,
                operation,
                attempts,
                elapsed,
                ..
            } => record_call(dependency, operation, "non_retryable", attempts, elapsed),
            CallEvent::CallExhausted {
                dependency,
                operation,
                attempts,
                elapsed,
                ..
            } => record_call(dependency, operation, "exhausted", attempts, elapsed),
            CallEvent::CallCanceled {
                dependency,
                operation,
                attempts,
                elapsed,
            } => record_call(dependency, operation, "canceled", attempts, elapsed),
            CallEvent::CallTimedOut {
                dependency,
                operation,
                attempts,
                elapsed,
            } => record_call(dependency, operation, "timeout", attempts, elapsed),
        }
    }
}

#[cfg(feature = "metrics")]
fn record_call(
    dependency: &str,
    operation: &str,
    outcome: &str,
    attempts: u32,
    elapsed: std::time::Duration,
) {
    CALLS.with_label_values(&[dependency, operation, outcome]).inc();
    CALL_ATTEMPTS
        .with_label_values(&[dependency, outcome])
        .observe(attempts as f64);
    CALL_DURATION
        .with_label_values(&[dependency, operation, outcome])
        .observe(elapsed.as_secs_f64());
}

// No-op implementation when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
impl CallObserver for MetricsObserver {
    fn on_event(&self, _event: &CallEvent<'_>) {}
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_call_outcomes_are_counted() {
        let event = CallEvent::CallSucceeded {
            dependency: "metrics-test",
            operation: "GetProduct",
            attempts: 2,
            elapsed: Duration::from_millis(120),
        };
        MetricsObserver.on_event(&event);
        MetricsObserver.on_event(&event);

        let count = CALLS
            .with_label_values(&["metrics-test", "GetProduct", "success"])
            .get();
        assert_eq!(count, 2);
    }
}
