/// Preset executor configurations for the catalog dependencies
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::executor::ExecutorConfig;
use crate::retry::RetryPolicy;
use std::time::Duration;

/// Generic internal gRPC dependency
///
/// - Timeout: 30s per attempt
/// - Circuit breaker: 5 failures, 30s cooldown
/// - Retry: 3 attempts, 100ms doubling up to 2s
pub fn grpc_config() -> ExecutorConfig {
    ExecutorConfig {
        retry: RetryPolicy::default(),
        circuit_breaker: CircuitBreakerConfig::default(),
        per_call_timeout: Duration::from_secs(30),
        batch_call_timeout: Duration::from_secs(30),
    }
}

/// Product and variant reads
///
/// - Timeout: 5s for single lookups, 10s for batches and listings
/// - Circuit breaker: 5 failures, 30s cooldown
/// - Retry: 3 attempts, 100ms doubling up to 2s
pub fn catalog_read_config() -> ExecutorConfig {
    ExecutorConfig {
        per_call_timeout: Duration::from_secs(5),
        batch_call_timeout: Duration::from_secs(10),
        ..grpc_config()
    }
}

/// Stock checks, decrements and rollbacks
///
/// - Timeout: 30s per attempt
/// - Circuit breaker and retry as for reads; mutations are keyed by order id
pub fn stock_config() -> ExecutorConfig {
    grpc_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grpc_config() {
        let config = grpc_config();
        assert_eq!(config.per_call_timeout, Duration::from_secs(30));
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.open_cooldown, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_catalog_read_config() {
        let config = catalog_read_config();
        assert_eq!(config.per_call_timeout, Duration::from_secs(5));
        assert_eq!(config.batch_call_timeout, Duration::from_secs(10));
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stock_config() {
        let config = stock_config();
        assert_eq!(config.per_call_timeout, Duration::from_secs(30));
        assert_eq!(config.retry, catalog_read_config().retry);
    }
}
