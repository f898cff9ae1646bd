/// Tower integration: guard any cloneable service (for example a tonic
/// generated client) with a [`ResilientExecutor`]
use crate::error::CallError;
use crate::executor::{CallContext, ResilientExecutor};
use futures_util::future::BoxFuture;
use std::fmt;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Service, ServiceExt};
use tower_layer::Layer;

pub struct ResilienceLayer<E> {
    executor: ResilientExecutor<E>,
    operation: &'static str,
    per_call_timeout: Option<Duration>,
}

impl<E> ResilienceLayer<E> {
    pub fn new(executor: ResilientExecutor<E>, operation: &'static str) -> Self {
        Self {
            executor,
            operation,
            per_call_timeout: None,
        }
    }

    /// Override the executor's default per-call timeout
    pub fn per_call_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = Some(timeout);
        self
    }
}

impl<E> Clone for ResilienceLayer<E> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            operation: self.operation,
            per_call_timeout: self.per_call_timeout,
        }
    }
}

impl<S, E> Layer<S> for ResilienceLayer<E> {
    type Service = ResilienceService<S, E>;

    fn layer(&self, service: S) -> Self::Service {
        ResilienceService {
            inner: service,
            executor: self.executor.clone(),
            operation: self.operation,
            per_call_timeout: self.per_call_timeout,
        }
    }
}

pub struct ResilienceService<S, E> {
    inner: S,
    executor: ResilientExecutor<E>,
    operation: &'static str,
    per_call_timeout: Option<Duration>,
}

impl<S: Clone, E> Clone for ResilienceService<S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            executor: self.executor.clone(),
            operation: self.operation,
            per_call_timeout: self.per_call_timeout,
        }
    }
}

impl<S, E> ResilienceService<S, E> {
    pub fn executor(&self) -> &ResilientExecutor<E> {
        &self.executor
    }
}

impl<S, E, Request> Service<Request> for ResilienceService<S, E>
where
    S: Service<Request, Error = E> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send,
    E: fmt::Display + Send + 'static,
    Request: Clone + Send + 'static,
{
    type Response = S::Response;
    type Error = CallError<E>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    // Readiness of the inner service is awaited per attempt
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let executor = self.executor.clone();
        let inner = self.inner.clone();
        let operation = self.operation;
        let timeout = self
            .per_call_timeout
            .unwrap_or(executor.config().per_call_timeout);

        Box::pin(async move {
            let ctx = CallContext::background();
            executor
                .execute(&ctx, operation, timeout, req, move |req| inner.clone().oneshot(req))
                .await
        })
    }
}
