//! Listings RPC transport
//!
//! [`ListingsTransport`] is the seam between the resilient client and the
//! wire: one method per RPC, each making exactly one attempt. Production code
//! uses [`GrpcListingsTransport`]; tests substitute their own implementation.

use crate::proto::*;
use async_trait::async_trait;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Status};

#[async_trait]
pub trait ListingsTransport: Send + Sync + 'static {

    async fn get_listing(&self, req: GetListingRequest) -> Result<GetListingResponse, Status>;

    async fn create_listing(
        &self,
        req: CreateListingRequest,
    ) -> Result<CreateListingResponse, Status>;

    async fn update_listing(
        &self,
        req: UpdateListingRequest,
    ) -> Result<UpdateListingResponse, Status>;

    async fn delete_listing(
        &self,
        req: DeleteListingRequest,
    ) -> Result<DeleteListingResponse, Status>;

    async fn search_listings(
        &self,
        req: SearchListingsRequest,
    ) -> Result<SearchListingsResponse, Status>;

    async fn list_listings(&self, req: ListListingsRequest) -> Result<ListListingsResponse, Status>;

    async fn get_all_categories(&self) -> Result<CategoriesResponse, Status>;

    async fn add_to_favorites(&self, req: AddToFavoritesRequest) -> Result<(), Status>;

    async fn remove_from_favorites(&self, req: RemoveFromFavoritesRequest) -> Result<(), Status>;

    async fn get_user_favorites(
        &self,
        req: GetUserFavoritesRequest,
    ) -> Result<GetUserFavoritesResponse, Status>;

    async fn is_favorite(&self, req: IsFavoriteRequest) -> Result<IsFavoriteResponse, Status>;
    async fn get_product(&self, req: GetProductRequest) -> Result<ProductResponse, Status>;

    async fn get_products_by_skus(
        &self,
        req: GetProductsBySkusRequest,
    ) -> Result<ProductsResponse, Status>;

    async fn get_products_by_ids(
        &self,
        req: GetProductsByIdsRequest,
    ) -> Result<ProductsResponse, Status>;

    async fn list_products(&self, req: ListProductsRequest) -> Result<ProductsResponse, Status>;

    async fn get_variant(&self, req: GetVariantRequest) -> Result<VariantResponse, Status>;

    async fn get_variants_by_product_id(
        &self,
        req: GetVariantsByProductIdRequest,
    ) -> Result<ProductVariantsResponse, Status>;

    async fn check_stock_availability(
        &self,
        req: CheckStockAvailabilityRequest,
    ) -> Result<CheckStockAvailabilityResponse, Status>;

    async fn decrement_stock(
        &self,
        req: DecrementStockRequest,
    ) -> Result<DecrementStockResponse, Status>;

    async fn rollback_stock(
        &self,
        req: RollbackStockRequest,
    ) -> Result<RollbackStockResponse, Status>;
}

/// Unary calls over a tonic channel
#[derive(Debug, Clone)]
pub struct GrpcListingsTransport {
    inner: Grpc<Channel>,
}

impl GrpcListingsTransport {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: Grpc::new(channel),
        }
    }

    async fn unary<Req, Resp>(&self, method: &'static str, req: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("Service was not ready: {e}")))?;

        let path: PathAndQuery = format!("/{SERVICE_NAME}/{method}")
            .parse()
            .map_err(|e| Status::internal(format!("invalid method path: {e}")))?;
        let codec = ProstCodec::<Req, Resp>::default();

        let response = grpc.unary(Request::new(req), path, codec).await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl ListingsTransport for GrpcListingsTransport {

    async fn get_listing(&self, req: GetListingRequest) -> Result<GetListingResponse, Status> {
        self.unary("GetListing", req).await
    }

    async fn create_listing(
        &self,
        req: CreateListingRequest,
    ) -> Result<CreateListingResponse, Status> {
        self.unary("CreateListing", req).await
    }

    async fn update_listing(
        &self,
        req: UpdateListingRequest,
    ) -> Result<UpdateListingResponse, Status> {
        self.unary("UpdateListing", req).await
    }

    async fn delete_listing(
        &self,
        req: DeleteListingRequest,
    ) -> Result<DeleteListingResponse, Status> {
        self.unary("DeleteListing", req).await
    }

    async fn search_listings(
        &self,
        req: SearchListingsRequest,
    ) -> Result<SearchListingsResponse, Status> {
        self.unary("SearchListings", req).await
    }

    async fn list_listings(&self, req: ListListingsRequest) -> Result<ListListingsResponse, Status> {
        self.unary("ListListings", req).await
    }

    async fn get_all_categories(&self) -> Result<CategoriesResponse, Status> {
        self.unary("GetAllCategories", ()).await
    }

    async fn add_to_favorites(&self, req: AddToFavoritesRequest) -> Result<(), Status> {
        self.unary("AddToFavorites", req).await
    }

    async fn remove_from_favorites(&self, req: RemoveFromFavoritesRequest) -> Result<(), Status> {
        self.unary("RemoveFromFavorites", req).await
    }

    async fn get_user_favorites(
        &self,
        req: GetUserFavoritesRequest,
    ) -> Result<GetUserFavoritesResponse, Status> {
        self.unary("GetUserFavorites", req).await
    }

    async fn is_favorite(&self, req: IsFavoriteRequest) -> Result<IsFavoriteResponse, Status> {
        self.unary("IsFavorite", req).await
    }
    async fn get_product(&self, req: GetProductRequest) -> Result<ProductResponse, Status> {
        self.unary("GetProduct", req).await
    }

    async fn get_products_by_skus(
        &self,
        req: GetProductsBySkusRequest,
    ) -> Result<ProductsResponse, Status> {
        self.unary("GetProductsBySKUs", req).await
    }

    async fn get_products_by_ids(
        &self,
        req: GetProductsByIdsRequest,
    ) -> Result<ProductsResponse, Status> {
        self.unary("GetProductsByIDs", req).await
    }

    async fn list_products(&self, req: ListProductsRequest) -> Result<ProductsResponse, Status> {
        self.unary("ListProducts", req).await
    }

    async fn get_variant(&self, req: GetVariantRequest) -> Result<VariantResponse, Status> {
        self.unary("GetVariant", req).await
    }

    async fn get_variants_by_product_id(
        &self,
        req: GetVariantsByProductIdRequest,
    ) -> Result<ProductVariantsResponse, Status> {
        self.unary("GetVariantsByProductID", req).await
    }

    async fn check_stock_availability(
        &self,
        req: CheckStockAvailabilityRequest,
    ) -> Result<CheckStockAvailabilityResponse, Status> {
        self.unary("CheckStockAvailability", req).await
    }

    async fn decrement_stock(
        &self,
        req: DecrementStockRequest,
    ) -> Result<DecrementStockResponse, Status> {
        self.unary("DecrementStock", req).await
    }

    async fn rollback_stock(
        &self,
        req: RollbackStockRequest,
    ) -> Result<RollbackStockResponse, Status> {
        self.unary("RollbackStock", req).await
    }
}
