/// Circuit breaker guarding one downstream dependency
///
/// State transitions:
/// - Closed → Open: `failure_threshold` consecutive failures, or a single
///   `CircuitTrip` failure
/// - Open → HalfOpen: first admission check after `open_cooldown` (lazy, no timer)
/// - HalfOpen → Closed: the single probe succeeds
/// - HalfOpen → Open: the probe fails; cooldown restarts
///
/// Only one probe is in flight while HalfOpen; every other caller is rejected.
use crate::classifier::ErrorClass;
use crate::clock::{Clock, TokioClock};
use crate::error::ConfigError;
use crate::observer::{CallEvent, CallObserver, NoopObserver};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through
    Closed,
    /// Dependency considered down, calls fail fast
    Open,
    /// Cooldown elapsed, a single probe call decides
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a probe
    pub open_cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_cooldown: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        Ok(())
    }
}

/// Admission refused; the caller must fail fast
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("circuit {state:?}, call rejected")]
pub struct Rejected {
    pub state: CircuitState,
    /// Time left until a probe will be admitted, when known
    pub retry_after: Option<Duration>,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { since: Instant },
    HalfOpen { generation: u64, probe_in_flight: bool },
}

struct BreakerState {
    phase: Phase,
    consecutive_failures: u32,
    /// Bumped on every Open → HalfOpen so stale probe permits are recognisable
    generation: u64,
}

struct Inner {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn CallObserver>,
    state: Mutex<BreakerState>,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Inner>,
}

/// Proof of admission, handed back to `record_success` / `record_failure`
///
/// Dropping an unresolved probe permit frees the half-open slot, so an
/// abandoned call cannot wedge the breaker.
#[must_use = "a permit must be resolved with record_success / record_failure"]
pub struct Permit {
    breaker: CircuitBreaker,
    probe: Option<u64>,
}

impl Permit {
    pub fn is_probe(&self) -> bool {
        self.probe.is_some()
    }
}

impl fmt::Debug for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("breaker", &self.breaker.inner.name)
            .field("probe", &self.probe)
            .finish()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if let Some(generation) = self.probe {
            self.breaker.free_probe_slot(generation);
        }
    }
}

enum Transition {
    Opened { failures: u32, trigger: ErrorClass },
    HalfOpened,
    Closed,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_parts(name, config, Arc::new(TokioClock), Arc::new(NoopObserver))
    }

    pub fn with_parts(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn CallObserver>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                config,
                clock,
                observer,
                state: Mutex::new(BreakerState {
                    phase: Phase::Closed,
                    consecutive_failures: 0,
                    generation: 0,
                }),
            }),
        }
    }

    /// Ask to make a call
    pub fn admit(&self) -> Result<Permit, Rejected> {
        let now = self.inner.clock.now();
        let mut transition = None;

        let decision = {
            let mut state = self.inner.state.lock();
            match state.phase {
                Phase::Closed => Ok(None),
                Phase::Open { since } => {
                    let elapsed = now.saturating_duration_since(since);
                    if elapsed >= self.inner.config.open_cooldown {
                        state.generation += 1;
                        let generation = state.generation;
                        state.phase = Phase::HalfOpen {
                            generation,
                            probe_in_flight: true,
                        };
                        transition = Some(Transition::HalfOpened);
                        Ok(Some(generation))
                    } else {
                        Err(Rejected {
                            state: CircuitState::Open,
                            retry_after: Some(self.inner.config.open_cooldown - elapsed),
                        })
                    }
                }
                Phase::HalfOpen {
                    generation,
                    probe_in_flight,
                } => {
                    if probe_in_flight {
                        Err(Rejected {
                            state: CircuitState::HalfOpen,
                            retry_after: None,
                        })
                    } else {
                        state.phase = Phase::HalfOpen {
                            generation,
                            probe_in_flight: true,
                        };
                        Ok(Some(generation))
                    }
                }
            }
        };

        self.emit(transition);
        decision.map(|probe| Permit {
            breaker: self.clone(),
            probe,
        })
    }

    pub fn record_success(&self, permit: &Permit) {
        let mut transition = None;
        {
            let mut state = self.inner.state.lock();
            match state.phase {
                Phase::Closed => state.consecutive_failures = 0,
                Phase::HalfOpen { generation, .. } => {
                    state.consecutive_failures = 0;
                    if permit.probe == Some(generation) {
                        state.phase = Phase::Closed;
                        transition = Some(Transition::Closed);
                    }
                }
                // Reopened by a concurrent failure; the cooldown keeps running
                Phase::Open { .. } => {}
            }
        }
        self.emit(transition);
    }

    pub fn record_failure(&self, permit: &Permit, class: ErrorClass) {
        if class == ErrorClass::CallerCanceled {
            if let Some(generation) = permit.probe {
                self.free_probe_slot(generation);
            }
            return;
        }

        let now = self.inner.clock.now();
        let mut transition = None;
        {
            let mut state = self.inner.state.lock();
            match state.phase {
                Phase::Closed => {
                    state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                    if class == ErrorClass::CircuitTrip
                        || state.consecutive_failures >= self.inner.config.failure_threshold
                    {
                        state.phase = Phase::Open { since: now };
                        transition = Some(Transition::Opened {
                            failures: state.consecutive_failures,
                            trigger: class,
                        });
                    }
                }
                Phase::HalfOpen { generation, .. } => {
                    state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                    if permit.probe == Some(generation) || class == ErrorClass::CircuitTrip {
                        state.phase = Phase::Open { since: now };
                        transition = Some(Transition::Opened {
                            failures: state.consecutive_failures,
                            trigger: class,
                        });
                    }
                }
                Phase::Open { .. } => {}
            }
        }
        self.emit(transition);
    }

    /// Give the permit back without an outcome
    pub fn release(&self, permit: Permit) {
        drop(permit);
    }

    /// Current state as last transitioned; an expired Open stays Open until the next `admit`
    pub fn state(&self) -> CircuitState {
        match self.inner.state.lock().phase {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.state.lock().consecutive_failures
    }

    /// When the circuit last opened, if it is open now
    pub fn opened_at(&self) -> Option<Instant> {
        match self.inner.state.lock().phase {
            Phase::Open { since } => Some(since),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.inner.config
    }

    fn free_probe_slot(&self, probe_generation: u64) {
        let mut state = self.inner.state.lock();
        if let Phase::HalfOpen { generation, .. } = state.phase {
            if generation == probe_generation {
                state.phase = Phase::HalfOpen {
                    generation,
                    probe_in_flight: false,
                };
            }
        }
    }

    fn emit(&self, transition: Option<Transition>) {
        let dependency = self.inner.name.as_str();
        let event = match transition {
            None => return,
            Some(Transition::Opened { failures, trigger }) => CallEvent::CircuitOpened {
                dependency,
                consecutive_failures: failures,
                trigger,
            },
            Some(Transition::HalfOpened) => CallEvent::CircuitHalfOpened { dependency },
            Some(Transition::Closed) => CallEvent::CircuitClosed { dependency },
        };
        self.inner.observer.on_event(&event);
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .field("consecutive_failures", &self.consecutive_failures())
            .finish()
    }
}
