//! Resilient listings client
//!
//! Each operation validates its arguments, builds the wire request and hands a
//! single-attempt transport call to the shared [`ResilientExecutor`]. Circuit
//! breaking, retries and per-attempt timeouts are identical for every RPC;
//! only the timeout budget differs (single lookup, batch, stock, listing).

use crate::config::{ConfigError, ListingsClientConfig};
use crate::error::ListingsError;
use crate::proto::*;
use crate::transport::{GrpcListingsTransport, ListingsTransport};
use resilience::{
    CallContext, CallObserver, CircuitBreaker, MetricsObserver, ResilientExecutor,
    TracingObserver,
};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tonic::Status;
use tracing::{debug, info, warn};

pub const DEPENDENCY_NAME: &str = "listings";

pub const PAGE_RANGE: RangeInclusive<u32> = 1..=100_000;
pub const PAGE_SIZE_RANGE: RangeInclusive<u32> = 1..=1_000;
pub const LISTING_LIMIT_RANGE: RangeInclusive<i32> = 1..=100;

/// One page of `ListProducts`
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_count: i32,
}

/// One page of `SearchListings` or `ListListings`
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    pub total: i32,
}

pub struct ListingsClient<T> {
    transport: Arc<T>,
    executor: ResilientExecutor<Status>,
    stock_call_timeout: Duration,
    listing_call_timeout: Duration,
}

impl<T> Clone for ListingsClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            executor: self.executor.clone(),
            stock_call_timeout: self.stock_call_timeout,
            listing_call_timeout: self.listing_call_timeout,
        }
    }
}

impl ListingsClient<GrpcListingsTransport> {
    /// Client over a lazily connected channel
    ///
    /// The connection is established on the first call, so construction never
    /// blocks on the listings service being up.
    pub fn connect_lazy(config: &ListingsClientConfig) -> Result<Self, ConfigError> {
        info!(url = %config.url, "Creating listings gRPC client");
        let channel = config.connect_lazy()?;
        Self::with_config(GrpcListingsTransport::new(channel), config)
    }

    /// Client over an eagerly connected channel
    pub async fn connect(config: &ListingsClientConfig) -> Result<Self, ConfigError> {
        info!(url = %config.url, "Connecting to listings gRPC service");
        let channel = config.connect_channel().await?;
        Self::with_config(GrpcListingsTransport::new(channel), config)
    }
}

impl<T: ListingsTransport> ListingsClient<T> {
    /// Client reporting to `tracing` and Prometheus
    pub fn with_config(transport: T, config: &ListingsClientConfig) -> Result<Self, ConfigError> {
        Self::with_observer(transport, config, (TracingObserver, MetricsObserver))
    }

    pub fn with_observer(
        transport: T,
        config: &ListingsClientConfig,
        observer: impl CallObserver + 'static,
    ) -> Result<Self, ConfigError> {
        let executor = ResilientExecutor::builder(DEPENDENCY_NAME, resilience::GrpcStatusClassifier)
            .config(config.executor_config()?)
            .observer(observer)
            .build()?;
        Ok(Self::new(
            transport,
            executor,
            config.stock_call_timeout(),
            config.listing_call_timeout(),
        ))
    }

    /// Assemble from parts; the executor's breaker guards every operation
    pub fn new(
        transport: T,
        executor: ResilientExecutor<Status>,
        stock_call_timeout: Duration,
        listing_call_timeout: Duration,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            executor,
            stock_call_timeout,
            listing_call_timeout,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        self.executor.breaker()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ========== Listings ==========

    pub async fn get_listing(
        &self,
        ctx: &CallContext,
        request: GetListingRequest,
    ) -> Result<Listing, ListingsError> {
        let listing_id = request.id;
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "GetListing", self.listing_call_timeout, request, |req| {
                transport.get_listing(req)
            })
            .await?;

        debug!(listing_id, "GetListing successful");
        response
            .listing
            .ok_or_else(|| ListingsError::NotFound(format!("listing {listing_id}")))
    }

    pub async fn create_listing(
        &self,
        ctx: &CallContext,
        request: CreateListingRequest,
    ) -> Result<Listing, ListingsError> {
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "CreateListing", self.listing_call_timeout, request, |req| {
                transport.create_listing(req)
            })
            .await?;

        let listing = response
            .listing
            .ok_or_else(|| missing_listing("CreateListing"))?;
        info!(listing_id = listing.id, title = %listing.title, "Listing created successfully");
        Ok(listing)
    }

    /// Apply the fields set in `request`, leaving the rest unchanged
    pub async fn update_listing(
        &self,
        ctx: &CallContext,
        request: UpdateListingRequest,
    ) -> Result<Listing, ListingsError> {
        let listing_id = request.id;
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "UpdateListing", self.listing_call_timeout, request, |req| {
                transport.update_listing(req)
            })
            .await?;

        info!(listing_id, "Listing updated successfully");
        response
            .listing
            .ok_or_else(|| missing_listing("UpdateListing"))
    }

    /// Returns the service's `success` flag
    pub async fn delete_listing(
        &self,
        ctx: &CallContext,
        request: DeleteListingRequest,
    ) -> Result<bool, ListingsError> {
        let listing_id = request.id;
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "DeleteListing", self.listing_call_timeout, request, |req| {
                transport.delete_listing(req)
            })
            .await?;

        info!(listing_id, success = response.success, "Listing deleted");
        Ok(response.success)
    }

    /// Full-text search; `limit` must be in `1..=100` and `offset` non-negative
    pub async fn search_listings(
        &self,
        ctx: &CallContext,
        request: SearchListingsRequest,
    ) -> Result<ListingPage, ListingsError> {
        validate_window(request.limit, request.offset)?;
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "SearchListings", self.listing_call_timeout, request, |req| {
                transport.search_listings(req)
            })
            .await?;

        debug!(
            count = response.listings.len(),
            total = response.total,
            "SearchListings successful"
        );
        Ok(ListingPage {
            listings: response.listings,
            total: response.total,
        })
    }

    /// Filtered listing page; same window rules as [`search_listings`](Self::search_listings)
    pub async fn list_listings(
        &self,
        ctx: &CallContext,
        request: ListListingsRequest,
    ) -> Result<ListingPage, ListingsError> {
        validate_window(request.limit, request.offset)?;
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "ListListings", self.listing_call_timeout, request, |req| {
                transport.list_listings(req)
            })
            .await?;

        debug!(count = response.listings.len(), "ListListings successful");
        Ok(ListingPage {
            listings: response.listings,
            total: response.total,
        })
    }

    // ========== Categories ==========

    pub async fn get_all_categories(&self, ctx: &CallContext) -> Result<Vec<Category>, ListingsError> {
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "GetAllCategories", self.listing_call_timeout, (), |()| {
                transport.get_all_categories()
            })
            .await?;

        debug!(count = response.categories.len(), "GetAllCategories successful");
        Ok(response.categories)
    }

    // ========== Favorites ==========

    pub async fn add_to_favorites(
        &self,
        ctx: &CallContext,
        user_id: i64,
        listing_id: i64,
    ) -> Result<(), ListingsError> {
        let request = AddToFavoritesRequest {
            user_id,
            listing_id,
        };
        let transport = &self.transport;

        self.executor
            .execute(ctx, "AddToFavorites", self.listing_call_timeout, request, |req| {
                transport.add_to_favorites(req)
            })
            .await?;

        debug!(user_id, listing_id, "AddToFavorites successful");
        Ok(())
    }

    pub async fn remove_from_favorites(
        &self,
        ctx: &CallContext,
        user_id: i64,
        listing_id: i64,
    ) -> Result<(), ListingsError> {
        let request = RemoveFromFavoritesRequest {
            user_id,
            listing_id,
        };
        let transport = &self.transport;

        self.executor
            .execute(ctx, "RemoveFromFavorites", self.listing_call_timeout, request, |req| {
                transport.remove_from_favorites(req)
            })
            .await?;

        debug!(user_id, listing_id, "RemoveFromFavorites successful");
        Ok(())
    }

    /// Every listing id the user has favorited
    pub async fn get_user_favorites(
        &self,
        ctx: &CallContext,
        user_id: i64,
    ) -> Result<Vec<i64>, ListingsError> {
        let request = GetUserFavoritesRequest {
            user_id,
            limit: 0,
            offset: 0,
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "GetUserFavorites", self.listing_call_timeout, request, |req| {
                transport.get_user_favorites(req)
            })
            .await?;

        debug!(user_id, count = response.listing_ids.len(), "GetUserFavorites successful");
        Ok(response.listing_ids)
    }

    pub async fn is_favorite(
        &self,
        ctx: &CallContext,
        user_id: i64,
        listing_id: i64,
    ) -> Result<bool, ListingsError> {
        let request = IsFavoriteRequest {
            user_id,
            listing_id,
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute(ctx, "IsFavorite", self.listing_call_timeout, request, |req| {
                transport.is_favorite(req)
            })
            .await?;

        debug!(
            user_id,
            listing_id,
            is_favorite = response.is_favorite,
            "IsFavorite successful"
        );
        Ok(response.is_favorite)
    }

    // ========== Products ==========

    pub async fn get_product(
        &self,
        ctx: &CallContext,
        product_id: i64,
        storefront_id: Option<i64>,
    ) -> Result<Product, ListingsError> {
        let request = GetProductRequest {
            product_id,
            storefront_id,
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute_default(ctx, "GetProduct", request, |req| transport.get_product(req))
            .await?;

        debug!(product_id, "GetProduct successful");
        response
            .product
            .ok_or_else(|| ListingsError::NotFound(format!("product {product_id}")))
    }

    /// Products for a cart, looked up by SKU
    pub async fn get_products_by_skus(
        &self,
        ctx: &CallContext,
        skus: Vec<String>,
        storefront_id: Option<i64>,
    ) -> Result<Vec<Product>, ListingsError> {
        let requested = skus.len();
        let request = GetProductsBySkusRequest {
            skus,
            storefront_id,
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute_batch(ctx, "GetProductsBySKUs", request, |req| {
                transport.get_products_by_skus(req)
            })
            .await?;

        debug!(
            requested,
            found = response.products.len(),
            "GetProductsBySKUs successful"
        );
        Ok(response.products)
    }

    pub async fn get_products_by_ids(
        &self,
        ctx: &CallContext,
        product_ids: Vec<i64>,
        storefront_id: Option<i64>,
    ) -> Result<Vec<Product>, ListingsError> {
        let requested = product_ids.len();
        let request = GetProductsByIdsRequest {
            product_ids,
            storefront_id,
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute_batch(ctx, "GetProductsByIDs", request, |req| {
                transport.get_products_by_ids(req)
            })
            .await?;

        debug!(
            requested,
            found = response.products.len(),
            "GetProductsByIDs successful"
        );
        Ok(response.products)
    }

    /// Paginated products of a storefront
    ///
    /// `page` must be in `1..=100000` and `page_size` in `1..=1000`; anything
    /// else fails with `InvalidArgument` before the breaker is consulted.
    pub async fn list_products(
        &self,
        ctx: &CallContext,
        storefront_id: i64,
        page: u32,
        page_size: u32,
        is_active_only: bool,
    ) -> Result<ProductPage, ListingsError> {
        if !PAGE_RANGE.contains(&page) {
            return Err(ListingsError::InvalidArgument(format!(
                "invalid page parameter: {page}"
            )));
        }
        if !PAGE_SIZE_RANGE.contains(&page_size) {
            return Err(ListingsError::InvalidArgument(format!(
                "invalid page_size parameter: {page_size}"
            )));
        }

        let request = ListProductsRequest {
            storefront_id,
            // Both bounded well below i32::MAX above
            page: page as i32,
            page_size: page_size as i32,
            is_active_only: Some(is_active_only),
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute_batch(ctx, "ListProducts", request, |req| transport.list_products(req))
            .await?;

        debug!(
            storefront_id,
            count = response.products.len(),
            total = response.total_count,
            "ListProducts successful"
        );
        Ok(ProductPage {
            products: response.products,
            total_count: response.total_count,
        })
    }

    // ========== Variants ==========

    pub async fn get_variant(
        &self,
        ctx: &CallContext,
        variant_id: i64,
        product_id: Option<i64>,
    ) -> Result<ProductVariant, ListingsError> {
        let request = GetVariantRequest {
            variant_id,
            product_id,
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute_default(ctx, "GetVariant", request, |req| transport.get_variant(req))
            .await?;

        debug!(variant_id, "GetVariant successful");
        response
            .variant
            .ok_or_else(|| ListingsError::NotFound(format!("variant {variant_id}")))
    }

    pub async fn get_variants_by_product_id(
        &self,
        ctx: &CallContext,
        product_id: i64,
        is_active_only: bool,
    ) -> Result<Vec<ProductVariant>, ListingsError> {
        let request = GetVariantsByProductIdRequest {
            product_id,
            is_active_only: Some(is_active_only),
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute_default(ctx, "GetVariantsByProductID", request, |req| {
                transport.get_variants_by_product_id(req)
            })
            .await?;

        debug!(
            product_id,
            count = response.variants.len(),
            "GetVariantsByProductID successful"
        );
        Ok(response.variants)
    }

    // ========== Stock ==========

    /// Check availability before creating an order
    pub async fn check_stock_availability(
        &self,
        ctx: &CallContext,
        items: Vec<StockItem>,
    ) -> Result<CheckStockAvailabilityResponse, ListingsError> {
        let items_count = items.len();
        let request = CheckStockAvailabilityRequest { items };
        let transport = &self.transport;

        let response = self
            .executor
            .execute(
                ctx,
                "CheckStockAvailability",
                self.stock_call_timeout,
                request,
                |req| transport.check_stock_availability(req),
            )
            .await?;

        debug!(
            items_count,
            all_available = response.all_available,
            "CheckStockAvailability successful"
        );
        Ok(response)
    }

    /// Atomically decrement stock for an order
    ///
    /// `order_id` makes the decrement idempotent on the service side.
    pub async fn decrement_stock(
        &self,
        ctx: &CallContext,
        items: Vec<StockItem>,
        order_id: &str,
    ) -> Result<DecrementStockResponse, ListingsError> {
        let items_count = items.len();
        let request = DecrementStockRequest {
            items,
            order_id: Some(order_id.to_string()),
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute(
                ctx,
                "DecrementStock",
                self.stock_call_timeout,
                request,
                |req| transport.decrement_stock(req),
            )
            .await?;

        debug!(
            order_id,
            items_count,
            success = response.success,
            "DecrementStock successful"
        );
        Ok(response)
    }

    /// Restore stock taken by an order that is being rolled back
    pub async fn rollback_stock(
        &self,
        ctx: &CallContext,
        items: Vec<StockItem>,
        order_id: &str,
    ) -> Result<(), ListingsError> {
        let items_count = items.len();
        let request = RollbackStockRequest {
            items,
            order_id: Some(order_id.to_string()),
        };
        let transport = &self.transport;

        let response = self
            .executor
            .execute(
                ctx,
                "RollbackStock",
                self.stock_call_timeout,
                request,
                |req| transport.rollback_stock(req),
            )
            .await?;

        if response.success {
            debug!(order_id, items_count, "RollbackStock successful");
        } else {
            warn!(
                order_id,
                items_count,
                error = response.error.as_deref().unwrap_or(""),
                "RollbackStock completed with unsuccessful items"
            );
        }
        Ok(())
    }
}

fn validate_window(limit: i32, offset: i32) -> Result<(), ListingsError> {
    if !LISTING_LIMIT_RANGE.contains(&limit) {
        return Err(ListingsError::InvalidArgument(format!(
            "invalid limit parameter: {limit}"
        )));
    }
    if offset < 0 {
        return Err(ListingsError::InvalidArgument(format!(
            "invalid offset parameter: {offset}"
        )));
    }
    Ok(())
}

fn missing_listing(operation: &str) -> ListingsError {
    ListingsError::Upstream {
        code: tonic::Code::Internal,
        message: format!("{operation} response carried no listing"),
        attempts: None,
    }
}
