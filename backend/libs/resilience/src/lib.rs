//! Resilient outbound calls for catalog dependencies
//!
//! Every outbound operation runs through one [`ResilientExecutor`], which combines:
//! - **Circuit Breaker**: fails fast once a dependency keeps failing, probes it after a cooldown
//! - **Retry**: capped exponential backoff for transient failures
//! - **Timeout**: per-attempt limits, capped by the caller's deadline
//! - **Classification**: one table decides retry and breaker behaviour per error
//! - **Cancellation**: callers abort in-flight attempts and backoff sleeps
//! - **Tower Layer**: the same guarantees for any cloneable `tower::Service`
//!
//! # Example: guarding a gRPC call
//!
//! ```rust,no_run
//! use resilience::{presets, CallContext, ResilientExecutor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let executor = ResilientExecutor::grpc("listings", presets::catalog_read_config())
//!         .expect("valid preset");
//!
//!     let ctx = CallContext::background();
//!     let result = executor
//!         .execute_default(&ctx, "GetProduct", 42_i64, |product_id| async move {
//!             // Your gRPC call here
//!             Ok::<_, tonic::Status>(product_id)
//!         })
//!         .await;
//! }
//! ```

pub mod circuit_breaker;
pub mod classifier;
pub mod clock;
pub mod error;
pub mod executor;
pub mod layer;
pub mod metrics;
pub mod observer;
pub mod presets;
pub mod retry;
pub mod timeout;

// Re-export main types for convenience
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Permit, Rejected};
pub use classifier::{classify_code, Classified, ErrorClass, ErrorClassifier, GrpcStatusClassifier};
pub use clock::{Clock, ManualClock, TokioClock};
pub use error::{AttemptError, CallError, ConfigError};
pub use executor::{CallContext, ExecutorBuilder, ExecutorConfig, ResilientExecutor};
pub use layer::{ResilienceLayer, ResilienceService};
pub use metrics::MetricsObserver;
pub use observer::{AttemptOutcome, CallEvent, CallObserver, NoopObserver, RecordingObserver, TracingObserver};
pub use presets::{catalog_read_config, grpc_config, stock_config};
pub use retry::RetryPolicy;
pub use timeout::{with_timeout_result, TimeoutError};
pub use tokio_util::sync::CancellationToken;
