//! Listings gRPC Client
//!
//! Typed, resilient access to the listings microservice (listings, categories,
//! favorites, products, variants and stock) for the marketplace backend.
//!
//! This library:
//! - Loads endpoint and resilience settings from `LISTINGS_*` variables
//! - Guards every RPC with one shared circuit breaker and retry policy
//! - Applies per-attempt timeouts (5s lookups, 10s batches, 30s stock and
//!   listing calls)
//! - Maps gRPC failures onto [`ListingsError`] with HTTP status hints

pub mod client;
pub mod config;
pub mod error;
pub mod proto;
pub mod transport;

pub use client::{ListingPage, ListingsClient, ProductPage, DEPENDENCY_NAME};
pub use config::{ConfigError, ListingsClientConfig};
pub use error::ListingsError;
pub use transport::{GrpcListingsTransport, ListingsTransport};

// Callers need the context type to cancel calls or set deadlines
pub use resilience::CallContext;
