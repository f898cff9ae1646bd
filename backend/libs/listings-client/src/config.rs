/// Listings client configuration
///
/// Endpoint, connection and resilience settings for the listings gRPC service.
/// Loaded from `LISTINGS_*` environment variables; anything unset keeps its
/// production default.
use resilience::{CircuitBreakerConfig, ExecutorConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity};

pub const ENV_PREFIX: &str = "LISTINGS_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(#[from] envy::Error),
    #[error("invalid resilience settings: {0}")]
    Resilience(#[from] resilience::ConfigError),
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] tonic::transport::Error),
    #[error("failed to read {path}: {source}")]
    Tls {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingsClientConfig {
    /// Listings gRPC endpoint
    pub url: String,

    /// gRPC connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// HTTP/2 keep-alive interval in seconds
    pub keepalive_interval_secs: u64,

    /// HTTP/2 keep-alive timeout in seconds
    pub keepalive_timeout_secs: u64,

    /// Maximum concurrent requests on the channel
    pub max_concurrent_requests: usize,

    /// Enable TLS/mTLS
    pub tls_enabled: bool,
    /// Optional custom domain name for TLS SNI/verification
    pub tls_domain_name: Option<String>,
    /// Path to CA certificate (PEM)
    pub tls_ca_cert_path: Option<String>,
    /// Path to client certificate (PEM) for mTLS
    pub tls_client_cert_path: Option<String>,
    /// Path to client private key (PEM) for mTLS
    pub tls_client_key_path: Option<String>,

    /// Attempts per call, first one included
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub backoff_jitter: bool,

    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before a probe is allowed
    pub open_cooldown_secs: u64,

    /// Per-attempt timeout for single product/variant lookups
    pub single_call_timeout_ms: u64,
    /// Per-attempt timeout for batch lookups and listings
    pub batch_call_timeout_ms: u64,
    /// Per-attempt timeout for stock checks and mutations
    pub stock_call_timeout_ms: u64,
    /// Per-attempt timeout for listing, category and favorites calls
    pub listing_call_timeout_ms: u64,
}

impl Default for ListingsClientConfig {
    fn default() -> Self {
        Self {
            url: "http://listings-service:50053".to_string(),
            connection_timeout_secs: 10,
            keepalive_interval_secs: 30,
            keepalive_timeout_secs: 10,
            max_concurrent_requests: 1000,

            tls_enabled: false,
            tls_domain_name: None,
            tls_ca_cert_path: None,
            tls_client_cert_path: None,
            tls_client_key_path: None,

            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            backoff_multiplier: 2.0,
            backoff_jitter: false,

            failure_threshold: 5,
            open_cooldown_secs: 30,

            single_call_timeout_ms: 5_000,
            batch_call_timeout_ms: 10_000,
            stock_call_timeout_ms: 30_000,
            listing_call_timeout_ms: 30_000,
        }
    }
}

impl ListingsClientConfig {
    /// Load configuration from `LISTINGS_*` environment variables
    /// (and a local `.env` file when present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        config.executor_config()?;
        Ok(config)
    }

    /// Configuration for development/testing
    pub fn development() -> Self {
        Self {
            url: "http://localhost:50053".to_string(),
            connection_timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.backoff_multiplier,
            jitter: self.backoff_jitter,
        }
    }

    pub fn stock_call_timeout(&self) -> Duration {
        Duration::from_millis(self.stock_call_timeout_ms)
    }

    pub fn listing_call_timeout(&self) -> Duration {
        Duration::from_millis(self.listing_call_timeout_ms)
    }

    /// Resilience settings, validated
    pub fn executor_config(&self) -> Result<ExecutorConfig, resilience::ConfigError> {
        let config = ExecutorConfig {
            retry: self.retry_policy(),
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: self.failure_threshold,
                open_cooldown: Duration::from_secs(self.open_cooldown_secs),
            },
            per_call_timeout: Duration::from_millis(self.single_call_timeout_ms),
            batch_call_timeout: Duration::from_millis(self.batch_call_timeout_ms),
        };
        config.validate()?;
        if self.stock_call_timeout_ms == 0 {
            return Err(resilience::ConfigError::ZeroTimeout("stock"));
        }
        if self.listing_call_timeout_ms == 0 {
            return Err(resilience::ConfigError::ZeroTimeout("listing"));
        }
        Ok(config)
    }

    /// Build a tonic Endpoint with timeouts/keepalive and optional TLS/mTLS
    ///
    /// No request timeout is set on the endpoint; per-attempt deadlines are
    /// enforced by the executor.
    pub fn make_endpoint(&self) -> Result<Endpoint, ConfigError> {
        let mut ep = Endpoint::from_shared(self.url.clone())?
            .connect_timeout(Duration::from_secs(self.connection_timeout_secs))
            .http2_keep_alive_interval(Duration::from_secs(self.keepalive_interval_secs))
            .keep_alive_timeout(Duration::from_secs(self.keepalive_timeout_secs))
            .tcp_nodelay(true)
            .concurrency_limit(self.max_concurrent_requests);

        if self.tls_enabled {
            let mut tls = ClientTlsConfig::new();

            if let Some(ca_path) = &self.tls_ca_cert_path {
                tls = tls.ca_certificate(Certificate::from_pem(read_pem(ca_path)?));
            }

            if let Some(domain) = &self.tls_domain_name {
                tls = tls.domain_name(domain);
            }

            if let (Some(cert_path), Some(key_path)) =
                (&self.tls_client_cert_path, &self.tls_client_key_path)
            {
                let identity = Identity::from_pem(read_pem(cert_path)?, read_pem(key_path)?);
                tls = tls.identity(identity);
            }

            ep = ep.tls_config(tls)?;
        }

        Ok(ep)
    }

    /// Connect eagerly, bounded by `connection_timeout_secs`
    pub async fn connect_channel(&self) -> Result<Channel, ConfigError> {
        let endpoint = self.make_endpoint()?;
        let timeout = Duration::from_secs(self.connection_timeout_secs);

        resilience::with_timeout_result(timeout, endpoint.connect())
            .await
            .map_err(|e| ConfigError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            })
    }

    /// Channel that connects on first use
    pub fn connect_lazy(&self) -> Result<Channel, ConfigError> {
        Ok(self.make_endpoint()?.connect_lazy())
    }
}

fn read_pem(path: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|source| ConfigError::Tls {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "LISTINGS_URL",
        "LISTINGS_MAX_ATTEMPTS",
        "LISTINGS_FAILURE_THRESHOLD",
        "LISTINGS_BACKOFF_JITTER",
        "LISTINGS_TLS_DOMAIN_NAME",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_uses_defaults() {
        clear_env();
        let config = ListingsClientConfig::from_env().unwrap();
        assert_eq!(config.url, "http://listings-service:50053");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.failure_threshold, 5);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("LISTINGS_URL", "http://listings.internal:9000");
        env::set_var("LISTINGS_MAX_ATTEMPTS", "5");
        env::set_var("LISTINGS_BACKOFF_JITTER", "true");
        env::set_var("LISTINGS_TLS_DOMAIN_NAME", "listings.svc");

        let config = ListingsClientConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.url, "http://listings.internal:9000");
        assert_eq!(config.max_attempts, 5);
        assert!(config.backoff_jitter);
        assert_eq!(config.tls_domain_name.as_deref(), Some("listings.svc"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_invalid_resilience_settings() {
        clear_env();
        env::set_var("LISTINGS_FAILURE_THRESHOLD", "0");

        let result = ListingsClientConfig::from_env();
        clear_env();

        assert!(matches!(
            result,
            Err(ConfigError::Resilience(resilience::ConfigError::ZeroFailureThreshold))
        ));
    }

    #[test]
    fn test_executor_config_matches_catalog_preset() {
        let config = ListingsClientConfig::default().executor_config().unwrap();
        assert_eq!(config, resilience::presets::catalog_read_config());
        assert_eq!(
            ListingsClientConfig::default().stock_call_timeout(),
            resilience::presets::stock_config().per_call_timeout
        );
        assert_eq!(
            ListingsClientConfig::default().listing_call_timeout(),
            resilience::presets::grpc_config().per_call_timeout
        );
    }

    #[test]
    fn test_zero_listing_timeout_is_rejected() {
        let config = ListingsClientConfig {
            listing_call_timeout_ms: 0,
            ..Default::default()
        };

        assert_eq!(
            config.executor_config(),
            Err(resilience::ConfigError::ZeroTimeout("listing"))
        );
    }

    #[test]
    fn test_make_endpoint_rejects_bad_url() {
        let config = ListingsClientConfig {
            url: "not a url".to_string(),
            ..ListingsClientConfig::development()
        };
        assert!(matches!(config.make_endpoint(), Err(ConfigError::Endpoint(_))));
    }

    #[test]
    fn test_missing_ca_file_is_reported() {
        let config = ListingsClientConfig {
            tls_enabled: true,
            tls_ca_cert_path: Some("/nonexistent/ca.pem".to_string()),
            ..ListingsClientConfig::development()
        };
        assert!(matches!(config.make_endpoint(), Err(ConfigError::Tls { .. })));
    }
}
