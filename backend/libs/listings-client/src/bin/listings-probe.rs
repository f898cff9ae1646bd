//! Listings Probe - fetch one product through the resilient client
//!
//! Useful for checking connectivity, TLS and breaker settings from inside a
//! deployment. Prints the product as JSON on stdout.
//!
//! Usage: `listings-probe <product_id> [storefront_id]`
//!
//! Environment variables:
//! - LISTINGS_URL: listings gRPC endpoint (default: "http://listings-service:50053")
//! - LISTINGS_*: any other `ListingsClientConfig` field
//! - PROBE_DEADLINE_SECS: overall deadline for the call (default: 30)
//! - LOG_FORMAT: "json" for JSON logs, anything else for plain text

use anyhow::{bail, Context, Result};
use listings_client::{CallContext, ListingsClient, ListingsClientConfig};
use std::time::Duration;
use tracing::{error, info};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("listings_probe=info,listings_client=info,resilience=info")
    });

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn parse_args() -> Result<(i64, Option<i64>)> {
    let mut args = std::env::args().skip(1);
    let Some(product_id) = args.next() else {
        bail!("usage: listings-probe <product_id> [storefront_id]");
    };
    let product_id = product_id
        .parse::<i64>()
        .with_context(|| format!("invalid product_id: {product_id}"))?;
    let storefront_id = args
        .next()
        .map(|s| s.parse::<i64>().with_context(|| format!("invalid storefront_id: {s}")))
        .transpose()?;
    Ok((product_id, storefront_id))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let (product_id, storefront_id) = parse_args()?;

    let config = ListingsClientConfig::from_env().context("failed to load listings config")?;
    info!(
        url = %config.url,
        max_attempts = config.max_attempts,
        failure_threshold = config.failure_threshold,
        "Configuration loaded"
    );

    let deadline_secs: u64 = std::env::var("PROBE_DEADLINE_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    let client = ListingsClient::connect_lazy(&config).context("failed to create listings client")?;
    let ctx = CallContext::background().with_timeout(Duration::from_secs(deadline_secs));

    // Ctrl-C cancels the in-flight call and any backoff wait
    let canceler = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceler.cancel();
        }
    });

    match client.get_product(&ctx, product_id, storefront_id).await {
        Ok(product) => {
            println!("{}", serde_json::to_string_pretty(&product)?);
            Ok(())
        }
        Err(e) => {
            error!(
                product_id,
                http_status = e.http_status(),
                retryable = e.is_retryable_upstream(),
                error = %e,
                "Probe failed"
            );
            Err(e.into())
        }
    }
}
