//! Wire messages of `listings.v1.ListingsService`
//!
//! Only the messages used by this client are declared, by hand. Field names
//! match the listings service; the tag numbers are assigned here and must be
//! kept in step with the service's `.proto` when it changes.
//!
//! `GetAllCategories`, `AddToFavorites` and `RemoveFromFavorites` exchange
//! `google.protobuf.Empty`, which prost maps to `()`.

use serde::Serialize;

pub const SERVICE_NAME: &str = "listings.v1.ListingsService";

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Product {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub storefront_id: i64,
    #[prost(string, tag = "3")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub description: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub sku: ::prost::alloc::string::String,
    #[prost(double, tag = "6")]
    pub price: f64,
    #[prost(string, tag = "7")]
    pub currency: ::prost::alloc::string::String,
    #[prost(int32, tag = "8")]
    pub stock_quantity: i32,
    #[prost(bool, tag = "9")]
    pub is_active: bool,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct ProductVariant {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub product_id: i64,
    #[prost(string, tag = "3")]
    pub sku: ::prost::alloc::string::String,
    #[prost(double, optional, tag = "4")]
    pub price: ::core::option::Option<f64>,
    #[prost(int32, tag = "5")]
    pub stock_quantity: i32,
    #[prost(bool, tag = "6")]
    pub is_active: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProductRequest {
    #[prost(int64, tag = "1")]
    pub product_id: i64,
    #[prost(int64, optional, tag = "2")]
    pub storefront_id: ::core::option::Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProductResponse {
    #[prost(message, optional, tag = "1")]
    pub product: ::core::option::Option<Product>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProductsBySkusRequest {
    #[prost(string, repeated, tag = "1")]
    pub skus: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(int64, optional, tag = "2")]
    pub storefront_id: ::core::option::Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProductsByIdsRequest {
    #[prost(int64, repeated, tag = "1")]
    pub product_ids: ::prost::alloc::vec::Vec<i64>,
    #[prost(int64, optional, tag = "2")]
    pub storefront_id: ::core::option::Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListProductsRequest {
    #[prost(int64, tag = "1")]
    pub storefront_id: i64,
    #[prost(int32, tag = "2")]
    pub page: i32,
    #[prost(int32, tag = "3")]
    pub page_size: i32,
    #[prost(bool, optional, tag = "4")]
    pub is_active_only: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProductsResponse {
    #[prost(message, repeated, tag = "1")]
    pub products: ::prost::alloc::vec::Vec<Product>,
    #[prost(int32, tag = "2")]
    pub total_count: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVariantRequest {
    #[prost(int64, tag = "1")]
    pub variant_id: i64,
    #[prost(int64, optional, tag = "2")]
    pub product_id: ::core::option::Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VariantResponse {
    #[prost(message, optional, tag = "1")]
    pub variant: ::core::option::Option<ProductVariant>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVariantsByProductIdRequest {
    #[prost(int64, tag = "1")]
    pub product_id: i64,
    #[prost(bool, optional, tag = "2")]
    pub is_active_only: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProductVariantsResponse {
    #[prost(message, repeated, tag = "1")]
    pub variants: ::prost::alloc::vec::Vec<ProductVariant>,
}

// ========== Listings ==========

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Listing {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub user_id: i64,
    #[prost(int64, optional, tag = "3")]
    pub storefront_id: ::core::option::Option<i64>,
    #[prost(string, tag = "4")]
    pub title: ::prost::alloc::string::String,
    #[prost(string, optional, tag = "5")]
    pub description: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(double, tag = "6")]
    pub price: f64,
    #[prost(string, tag = "7")]
    pub currency: ::prost::alloc::string::String,
    #[prost(int64, tag = "8")]
    pub category_id: i64,
    #[prost(string, tag = "9")]
    pub status: ::prost::alloc::string::String,
    #[prost(int32, tag = "10")]
    pub quantity: i32,
    #[prost(string, optional, tag = "11")]
    pub sku: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetListingRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, optional, tag = "2")]
    pub lang: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetListingResponse {
    #[prost(message, optional, tag = "1")]
    pub listing: ::core::option::Option<Listing>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateListingRequest {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(int64, optional, tag = "2")]
    pub storefront_id: ::core::option::Option<i64>,
    #[prost(string, tag = "3")]
    pub title: ::prost::alloc::string::String,
    #[prost(string, optional, tag = "4")]
    pub description: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(double, tag = "5")]
    pub price: f64,
    #[prost(string, tag = "6")]
    pub currency: ::prost::alloc::string::String,
    #[prost(int64, tag = "7")]
    pub category_id: i64,
    #[prost(int32, tag = "8")]
    pub quantity: i32,
    #[prost(string, optional, tag = "9")]
    pub sku: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateListingResponse {
    #[prost(message, optional, tag = "1")]
    pub listing: ::core::option::Option<Listing>,
}

/// Partial update; unset fields are left unchanged
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateListingRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub user_id: i64,
    #[prost(string, optional, tag = "3")]
    pub title: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "4")]
    pub description: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(double, optional, tag = "5")]
    pub price: ::core::option::Option<f64>,
    #[prost(int32, optional, tag = "6")]
    pub quantity: ::core::option::Option<i32>,
    #[prost(string, optional, tag = "7")]
    pub status: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateListingResponse {
    #[prost(message, optional, tag = "1")]
    pub listing: ::core::option::Option<Listing>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteListingRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub user_id: i64,
    #[prost(bool, tag = "3")]
    pub is_admin: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteListingResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchListingsRequest {
    #[prost(string, tag = "1")]
    pub query: ::prost::alloc::string::String,
    #[prost(int64, optional, tag = "2")]
    pub category_id: ::core::option::Option<i64>,
    #[prost(double, optional, tag = "3")]
    pub min_price: ::core::option::Option<f64>,
    #[prost(double, optional, tag = "4")]
    pub max_price: ::core::option::Option<f64>,
    #[prost(int32, tag = "5")]
    pub limit: i32,
    #[prost(int32, tag = "6")]
    pub offset: i32,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct SearchListingsResponse {
    #[prost(message, repeated, tag = "1")]
    pub listings: ::prost::alloc::vec::Vec<Listing>,
    #[prost(int32, tag = "2")]
    pub total: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListListingsRequest {
    #[prost(int32, tag = "1")]
    pub limit: i32,
    #[prost(int32, tag = "2")]
    pub offset: i32,
    #[prost(int64, optional, tag = "3")]
    pub user_id: ::core::option::Option<i64>,
    #[prost(int64, optional, tag = "4")]
    pub storefront_id: ::core::option::Option<i64>,
    #[prost(int64, optional, tag = "5")]
    pub category_id: ::core::option::Option<i64>,
    #[prost(string, optional, tag = "6")]
    pub status: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(double, optional, tag = "7")]
    pub min_price: ::core::option::Option<f64>,
    #[prost(double, optional, tag = "8")]
    pub max_price: ::core::option::Option<f64>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct ListListingsResponse {
    #[prost(message, repeated, tag = "1")]
    pub listings: ::prost::alloc::vec::Vec<Listing>,
    #[prost(int32, tag = "2")]
    pub total: i32,
}

// ========== Categories ==========

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Category {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub slug: ::prost::alloc::string::String,
    #[prost(int64, optional, tag = "4")]
    pub parent_id: ::core::option::Option<i64>,
    #[prost(bool, tag = "5")]
    pub is_active: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CategoriesResponse {
    #[prost(message, repeated, tag = "1")]
    pub categories: ::prost::alloc::vec::Vec<Category>,
}

// ========== Favorites ==========

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddToFavoritesRequest {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(int64, tag = "2")]
    pub listing_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RemoveFromFavoritesRequest {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(int64, tag = "2")]
    pub listing_id: i64,
}

/// `limit` 0 means no limit
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetUserFavoritesRequest {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(int32, tag = "2")]
    pub limit: i32,
    #[prost(int32, tag = "3")]
    pub offset: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetUserFavoritesResponse {
    #[prost(int64, repeated, tag = "1")]
    pub listing_ids: ::prost::alloc::vec::Vec<i64>,
    #[prost(int32, tag = "2")]
    pub total: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IsFavoriteRequest {
    #[prost(int64, tag = "1")]
    pub user_id: i64,
    #[prost(int64, tag = "2")]
    pub listing_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IsFavoriteResponse {
    #[prost(bool, tag = "1")]
    pub is_favorite: bool,
}

// ========== Stock ==========

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct StockItem {
    #[prost(int64, tag = "1")]
    pub product_id: i64,
    #[prost(int64, optional, tag = "2")]
    pub variant_id: ::core::option::Option<i64>,
    #[prost(int32, tag = "3")]
    pub quantity: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckStockAvailabilityRequest {
    #[prost(message, repeated, tag = "1")]
    pub items: ::prost::alloc::vec::Vec<StockItem>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct StockAvailability {
    #[prost(int64, tag = "1")]
    pub product_id: i64,
    #[prost(int64, optional, tag = "2")]
    pub variant_id: ::core::option::Option<i64>,
    #[prost(int32, tag = "3")]
    pub requested_quantity: i32,
    #[prost(int32, tag = "4")]
    pub available_quantity: i32,
    #[prost(bool, tag = "5")]
    pub is_available: bool,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct CheckStockAvailabilityResponse {
    #[prost(bool, tag = "1")]
    pub all_available: bool,
    #[prost(message, repeated, tag = "2")]
    pub items: ::prost::alloc::vec::Vec<StockAvailability>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DecrementStockRequest {
    #[prost(message, repeated, tag = "1")]
    pub items: ::prost::alloc::vec::Vec<StockItem>,
    #[prost(string, optional, tag = "2")]
    pub order_id: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct StockResult {
    #[prost(int64, tag = "1")]
    pub product_id: i64,
    #[prost(int64, optional, tag = "2")]
    pub variant_id: ::core::option::Option<i64>,
    #[prost(int32, tag = "3")]
    pub stock_before: i32,
    #[prost(int32, tag = "4")]
    pub stock_after: i32,
    #[prost(bool, tag = "5")]
    pub success: bool,
    #[prost(string, optional, tag = "6")]
    pub error: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct DecrementStockResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(message, repeated, tag = "2")]
    pub results: ::prost::alloc::vec::Vec<StockResult>,
    #[prost(string, optional, tag = "3")]
    pub error: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RollbackStockRequest {
    #[prost(message, repeated, tag = "1")]
    pub items: ::prost::alloc::vec::Vec<StockItem>,
    #[prost(string, optional, tag = "2")]
    pub order_id: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RollbackStockResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(message, repeated, tag = "2")]
    pub results: ::prost::alloc::vec::Vec<StockResult>,
    #[prost(string, optional, tag = "3")]
    pub error: ::core::option::Option<::prost::alloc::string::String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_optional_fields_survive_encoding() {
        let request = DecrementStockRequest {
            items: vec![StockItem {
                product_id: 8000,
                variant_id: Some(12),
                quantity: 25,
            }],
            order_id: Some("ORDER-TEST-001".to_string()),
        };

        let bytes = request.encode_to_vec();
        let decoded = DecrementStockRequest::decode(bytes.as_slice()).unwrap();

        assert_eq!(decoded, request);
    }

    #[test]
    fn test_partial_update_leaves_unset_fields_absent() {
        let request = UpdateListingRequest {
            id: 77,
            user_id: 5,
            status: Some("active".to_string()),
            ..Default::default()
        };

        let decoded = UpdateListingRequest::decode(request.encode_to_vec().as_slice()).unwrap();

        assert_eq!(decoded.status.as_deref(), Some("active"));
        assert!(decoded.title.is_none());
        assert!(decoded.price.is_none());
    }

    #[test]
    fn test_absent_message_decodes_as_none() {
        let decoded = ProductResponse::decode(&[][..]).unwrap();
        assert!(decoded.product.is_none());
    }
}
