//! Resilient call executor
//!
//! Every outbound operation delegates to [`ResilientExecutor::execute`], which
//! wraps one logical call in:
//!
//! 1. circuit breaker admission (fast fail when the dependency is known bad)
//! 2. a sequential attempt loop with capped exponential backoff
//! 3. a per-attempt timeout, further capped by the caller's deadline
//! 4. breaker feedback derived from the classifier's verdict
//!
//! Caller cancellation aborts both an in-flight attempt and a backoff sleep, and
//! never counts against the dependency.

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, Permit};
use crate::classifier::{ErrorClass, ErrorClassifier, GrpcStatusClassifier};
use crate::clock::{Clock, TokioClock};
use crate::error::{AttemptError, CallError, ConfigError};
use crate::observer::{AttemptOutcome, CallEvent, CallObserver, NoopObserver};
use crate::retry::RetryPolicy;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Caller-side lifetime of a call: cancellation plus an optional overall deadline
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// No deadline, never canceled unless `cancel` is called
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Deadline relative to tokio's clock
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let now = TokioClock.now();
        self.with_deadline(now + timeout)
    }

    /// Context canceled together with this one, keeping its deadline
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

/// Settings for one downstream dependency
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    pub retry: RetryPolicy,
    pub circuit_breaker: CircuitBreakerConfig,
    /// Per-attempt timeout for single-entity operations
    pub per_call_timeout: Duration,
    /// Per-attempt timeout for bulk operations
    pub batch_call_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            per_call_timeout: Duration::from_secs(5),
            batch_call_timeout: Duration::from_secs(10),
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()?;
        self.circuit_breaker.validate()?;
        if self.per_call_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("per-call"));
        }
        if self.batch_call_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("batch"));
        }
        Ok(())
    }
}

struct ExecutorInner<E> {
    config: ExecutorConfig,
    breaker: CircuitBreaker,
    classifier: Arc<dyn ErrorClassifier<E>>,
    observer: Arc<dyn CallObserver>,
    clock: Arc<dyn Clock>,
}

/// Cheaply cloneable; clones share the breaker
pub struct ResilientExecutor<E> {
    inner: Arc<ExecutorInner<E>>,
}

impl<E> Clone for ResilientExecutor<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for ResilientExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientExecutor")
            .field("breaker", &self.inner.breaker)
            .field("config", &self.inner.config)
            .finish()
    }
}

pub struct ExecutorBuilder<E> {
    name: String,
    config: ExecutorConfig,
    classifier: Arc<dyn ErrorClassifier<E>>,
    observer: Arc<dyn CallObserver>,
    clock: Arc<dyn Clock>,
    breaker: Option<CircuitBreaker>,
}

impl<E> ExecutorBuilder<E> {
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn observer(mut self, observer: impl CallObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reuse a breaker already guarding the same dependency elsewhere
    pub fn breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn build(self) -> Result<ResilientExecutor<E>, ConfigError> {
        self.config.validate()?;

        let breaker = match self.breaker {
            Some(breaker) => breaker,
            None => CircuitBreaker::with_parts(
                self.name,
                self.config.circuit_breaker.clone(),
                Arc::clone(&self.clock),
                Arc::clone(&self.observer),
            ),
        };

        Ok(ResilientExecutor {
            inner: Arc::new(ExecutorInner {
                config: self.config,
                breaker,
                classifier: self.classifier,
                observer: self.observer,
                clock: self.clock,
            }),
        })
    }
}

impl ResilientExecutor<tonic::Status> {
    /// Executor for a gRPC dependency with [`GrpcStatusClassifier`]
    pub fn grpc(name: impl Into<String>, config: ExecutorConfig) -> Result<Self, ConfigError> {
        Self::builder(name, GrpcStatusClassifier).config(config).build()
    }
}

enum AttemptResult<T, E> {
    Done(Result<T, E>),
    TimedOut,
    Canceled,
}

impl<E> ResilientExecutor<E> {
    pub fn builder(
        name: impl Into<String>,
        classifier: impl ErrorClassifier<E> + 'static,
    ) -> ExecutorBuilder<E> {
        ExecutorBuilder {
            name: name.into(),
            config: ExecutorConfig::default(),
            classifier: Arc::new(classifier),
            observer: Arc::new(NoopObserver),
            clock: Arc::new(TokioClock),
            breaker: None,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.inner.breaker
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }

    pub fn name(&self) -> &str {
        self.inner.breaker.name()
    }
}

impl<E: fmt::Display> ResilientExecutor<E> {
    /// [`execute`](Self::execute) with the single-entity per-call timeout
    pub async fn execute_default<Req, Resp, F, Fut>(
        &self,
        ctx: &CallContext,
        operation: &str,
        request: Req,
        transport: F,
    ) -> Result<Resp, CallError<E>>
    where
        Req: Clone,
        F: FnMut(Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
    {
        let timeout = self.inner.config.per_call_timeout;
        self.execute(ctx, operation, timeout, request, transport).await
    }

    /// [`execute`](Self::execute) with the bulk per-call timeout
    pub async fn execute_batch<Req, Resp, F, Fut>(
        &self,
        ctx: &CallContext,
        operation: &str,
        request: Req,
        transport: F,
    ) -> Result<Resp, CallError<E>>
    where
        Req: Clone,
        F: FnMut(Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
    {
        let timeout = self.inner.config.batch_call_timeout;
        self.execute(ctx, operation, timeout, request, transport).await
    }

    /// Run `transport` under the breaker, retry policy and timeouts.
    ///
    /// `request` is cloned for every attempt. Total latency is bounded by
    /// `per_call_timeout * max_attempts` plus the backoff delays, and never
    /// exceeds the context's deadline.
    pub async fn execute<Req, Resp, F, Fut>(
        &self,
        ctx: &CallContext,
        operation: &str,
        per_call_timeout: Duration,
        request: Req,
        mut transport: F,
    ) -> Result<Resp, CallError<E>>
    where
        Req: Clone,
        F: FnMut(Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
    {
        let inner = &*self.inner;
        let dependency = inner.breaker.name();
        let started = inner.clock.now();

        if ctx.is_canceled() {
            self.emit_canceled(operation, 0, started);
            return Err(CallError::Canceled {
                last: None,
                attempts: 0,
            });
        }

        let permit = match inner.breaker.admit() {
            Ok(permit) => permit,
            Err(rejected) => {
                inner.observer.on_event(&CallEvent::CallRejected {
                    dependency,
                    operation,
                    state: rejected.state,
                });
                return Err(CallError::ServiceUnavailable {
                    dependency: dependency.to_string(),
                });
            }
        };

        let policy = &inner.config.retry;
        let mut attempt: u32 = 0;
        let mut previous: Option<AttemptError<E>> = None;

        loop {
            attempt += 1;

            if attempt > 1 {
                let delay = policy.jittered_delay(attempt - 1);
                if let Some(remaining) = ctx.remaining(inner.clock.now()) {
                    if remaining <= delay {
                        return Err(self.deadline_exceeded(permit, operation, attempt - 1, started));
                    }
                }

                tokio::select! {
                    biased;
                    _ = ctx.token.cancelled() => {
                        return Err(self.canceled(
                            permit,
                            operation,
                            attempt - 1,
                            started,
                            previous,
                        ));
                    }
                    _ = inner.clock.sleep(delay) => {}
                }
            }

            let (attempt_timeout, capped_by_deadline) = match ctx.remaining(inner.clock.now()) {
                Some(remaining) if remaining.is_zero() => {
                    return Err(self.deadline_exceeded(permit, operation, attempt - 1, started));
                }
                Some(remaining) if remaining < per_call_timeout => (remaining, true),
                _ => (per_call_timeout, false),
            };

            inner.observer.on_event(&CallEvent::AttemptStarted {
                dependency,
                operation,
                attempt,
            });
            let attempt_started = inner.clock.now();

            let result = tokio::select! {
                biased;
                _ = ctx.token.cancelled() => AttemptResult::Canceled,
                res = transport(request.clone()) => AttemptResult::Done(res),
                _ = inner.clock.sleep(attempt_timeout) => AttemptResult::TimedOut,
            };

            let (class, last) = match result {
                AttemptResult::Done(Ok(response)) => {
                    inner.breaker.record_success(&permit);
                    inner.observer.on_event(&CallEvent::CallSucceeded {
                        dependency,
                        operation,
                        attempts: attempt,
                        elapsed: self.elapsed(started),
                    });
                    return Ok(response);
                }
                AttemptResult::Canceled => {
                    return Err(self.canceled(permit, operation, attempt, started, previous));
                }
                // The caller's deadline, not the dependency, cut this attempt short
                AttemptResult::TimedOut if capped_by_deadline => {
                    return Err(self.deadline_exceeded(permit, operation, attempt, started));
                }
                AttemptResult::TimedOut => {
                    (ErrorClass::Retryable, AttemptError::TimedOut(attempt_timeout))
                }
                AttemptResult::Done(Err(err)) => (inner.classifier.classify(&err), AttemptError::Transport(err)),
            };

            let error_text = last.to_string();
            let outcome = AttemptOutcome {
                attempt,
                elapsed: self.elapsed(attempt_started),
                class: Some(class),
                error: Some(error_text.clone()),
            };
            inner.observer.on_event(&CallEvent::AttemptFailed {
                dependency,
                operation,
                outcome: &outcome,
            });

            match class {
                ErrorClass::NonRetryable | ErrorClass::CallerCanceled => {
                    inner.breaker.record_failure(&permit, class);
                    inner.observer.on_event(&CallEvent::CallFailed {
                        dependency,
                        operation,
                        attempts: attempt,
                        elapsed: self.elapsed(started),
                        error: &error_text,
                    });
                    return Err(match last {
                        AttemptError::Transport(err) => CallError::NonRetryable(err),
                        timed_out @ AttemptError::TimedOut(_) => CallError::ExhaustedRetries {
                            last: timed_out,
                            attempts: attempt,
                        },
                    });
                }
                ErrorClass::CircuitTrip => {
                    inner.breaker.record_failure(&permit, class);
                    if policy.should_retry(attempt) {
                        previous = Some(last);
                        continue;
                    }
                }
                ErrorClass::Retryable => {
                    if policy.should_retry(attempt) {
                        previous = Some(last);
                        continue;
                    }
                    inner.breaker.record_failure(&permit, class);
                }
            }

            inner.observer.on_event(&CallEvent::CallExhausted {
                dependency,
                operation,
                attempts: attempt,
                elapsed: self.elapsed(started),
                error: &error_text,
            });
            return Err(CallError::ExhaustedRetries {
                last,
                attempts: attempt,
            });
        }
    }

    fn elapsed(&self, since: Instant) -> Duration {
        self.inner.clock.now().saturating_duration_since(since)
    }

    fn canceled(
        &self,
        permit: Permit,
        operation: &str,
        attempts: u32,
        started: Instant,
        last: Option<AttemptError<E>>,
    ) -> CallError<E> {
        self.inner
            .breaker
            .record_failure(&permit, ErrorClass::CallerCanceled);
        self.emit_canceled(operation, attempts, started);
        CallError::Canceled { last, attempts }
    }

    fn emit_canceled(&self, operation: &str, attempts: u32, started: Instant) {
        self.inner.observer.on_event(&CallEvent::CallCanceled {
            dependency: self.name(),
            operation,
            attempts,
            elapsed: self.elapsed(started),
        });
    }

    fn deadline_exceeded(
        &self,
        permit: Permit,
        operation: &str,
        attempts: u32,
        started: Instant,
    ) -> CallError<E> {
        // Not attributable to the dependency: free the permit without an outcome
        self.inner.breaker.release(permit);
        let elapsed = self.elapsed(started);
        self.inner.observer.on_event(&CallEvent::CallTimedOut {
            dependency: self.name(),
            operation,
            attempts,
            elapsed,
        });
        CallError::Timeout { elapsed }
    }
}
