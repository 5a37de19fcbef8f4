//! HTTP handlers for the marketplace API.
//!
//! Every endpoint except user registration takes the caller's API key as
//! `Authorization: Bearer <key>`. Store ids contain a `/` and must be
//! percent-encoded in paths (`alice%2Fshop`).

#![allow(clippy::missing_errors_doc)] // Handlers: errors are the mapped `AppError`

use crate::error::MarketError;
use crate::service::Marketplace;
use crate::types::{
    ApiKey, Category, CategoryId, CustomerAccount, LinkToken, Money, NewProduct, Order, OrderId,
    Product, ProductId, Store, StoreId, User, UserId,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use bazaar_runtime::HealthCheck;
use bazaar_runtime::metrics::MetricsRecorder;
use bazaar_web::{AppError, BearerToken, CorrelationId, ReadinessProbe};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

/// Default page size for product listings
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Shared state for every handler
#[derive(Clone, Debug)]
pub struct AppState {
    /// The marketplace service
    pub market: Marketplace,
    /// Prometheus recorder backing `/metrics`
    pub metrics: Arc<MetricsRecorder>,
}

impl AppState {
    /// Creates handler state
    #[must_use]
    pub fn new(market: Marketplace, metrics: MetricsRecorder) -> Self {
        Self {
            market,
            metrics: Arc::new(metrics),
        }
    }
}

impl ReadinessProbe for AppState {
    fn readiness(&self) -> HealthCheck {
        self.market.health()
    }
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        let message = err.to_string();
        match err {
            MarketError::NotFound(_) => Self::not_found(message),
            MarketError::Unauthorized => Self::unauthorized(message),
            MarketError::InsufficientFunds { .. } | MarketError::InsufficientInventory { .. } => {
                Self::new(StatusCode::CONFLICT, message, err.code())
            },
            MarketError::AlreadyExists(_) => Self::conflict(message),
            MarketError::InvalidQuantity
            | MarketError::InvalidName(_)
            | MarketError::AmountOverflow => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, err.code())
            },
            MarketError::TokenCollision => {
                let code = err.code();
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, code)
                    .with_source(anyhow::Error::new(err))
            },
            MarketError::Unavailable(_) => Self::unavailable(message),
        }
    }
}

fn key(BearerToken(token): BearerToken) -> ApiKey {
    ApiKey::new(token)
}

// ============================================================================
// Request / Response Types
// ============================================================================

/// Body of `POST /users`
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Caller identity from the identity provider
    pub caller_id: UserId,
    /// Display name
    pub name: String,
}

/// Freshly bound API key
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    /// Key to send as bearer token
    pub api_key: ApiKey,
}

/// Body of `POST /users/:user_id/balance`
#[derive(Debug, Deserialize)]
pub struct AddBalanceRequest {
    /// Amount to credit
    pub amount: Money,
}

/// Balance after a credit
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Credited user
    pub user_id: UserId,
    /// New balance
    pub balance: Money,
}

/// Body of `POST /stores`
#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    /// Store name, unique per owner
    pub name: String,
}

/// A created store
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreCreatedResponse {
    /// Derived store id
    pub store_id: StoreId,
    /// Link token bound to the store
    pub link: LinkToken,
}

/// A created product
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductCreatedResponse {
    /// Assigned product id
    pub product_id: ProductId,
    /// Link token bound to the product
    pub link: LinkToken,
}

/// A link token
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    /// The token
    pub link: LinkToken,
}

/// Pagination query for product listings
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Index of the first item
    #[serde(default)]
    pub start: usize,
    /// Maximum number of items
    pub limit: Option<usize>,
}

/// Body of `POST /orders`
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Paying user
    pub user_id: UserId,
    /// Ordered product
    pub product_id: ProductId,
    /// Units ordered
    pub quantity: u32,
}

/// A placed order
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderCreatedResponse {
    /// Assigned order id
    pub order_id: OrderId,
}

/// Body of `POST /categories` and `PUT /categories/:id`
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    /// Category name
    pub name: String,
    /// Category description
    #[serde(default)]
    pub description: String,
}

/// A created category
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryCreatedResponse {
    /// Assigned category id
    pub category_id: CategoryId,
}

/// Body of `POST /accounts/:user_id/wishlist`
#[derive(Debug, Deserialize)]
pub struct WishlistRequest {
    /// Wished product
    pub product_id: ProductId,
}

/// Body of `POST /accounts/:user_id/addresses`
#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    /// Address text
    pub address: String,
}

// ============================================================================
// Users
// ============================================================================

/// Register a caller, or rotate their key.
///
/// `POST /api/v1/users`
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiKeyResponse>), AppError> {
    let api_key = state
        .market
        .create_user(request.caller_id, request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiKeyResponse { api_key })))
}

/// The caller's own profile.
///
/// `GET /api/v1/users/me`
pub async fn get_me(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.market.get_user(&key(token)).await?))
}

/// Credit a user's balance.
///
/// `POST /api/v1/users/:user_id/balance`
pub async fn add_user_balance(
    State(state): State<AppState>,
    token: BearerToken,
    Path(user_id): Path<UserId>,
    Json(request): Json<AddBalanceRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = state
        .market
        .add_user_balance(key(token), user_id.clone(), request.amount)
        .await?;
    Ok(Json(BalanceResponse { user_id, balance }))
}

// ============================================================================
// Stores
// ============================================================================

/// Open a store owned by the caller.
///
/// `POST /api/v1/stores`
pub async fn create_store(
    State(state): State<AppState>,
    token: BearerToken,
    Json(request): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreCreatedResponse>), AppError> {
    let (store_id, link) = state.market.create_store(key(token), request.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(StoreCreatedResponse { store_id, link }),
    ))
}

/// The caller's stores.
///
/// `GET /api/v1/stores`
pub async fn list_stores(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<Vec<Store>>, AppError> {
    Ok(Json(state.market.list_stores(&key(token)).await?))
}

/// Mint a link token for one of the caller's stores.
///
/// `GET /api/v1/stores/:store_id/link`
pub async fn get_store_link(
    State(state): State<AppState>,
    token: BearerToken,
    Path(store_id): Path<StoreId>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.market.get_store_link(key(token), store_id).await?;
    Ok(Json(LinkResponse { link }))
}

/// Resolve a store link token.
///
/// `GET /api/v1/store-links/:token`
pub async fn get_store_by_link(
    State(state): State<AppState>,
    token: BearerToken,
    Path(link): Path<LinkToken>,
) -> Result<Json<Store>, AppError> {
    Ok(Json(state.market.get_store_by_link(&key(token), &link).await?))
}

// ============================================================================
// Products
// ============================================================================

/// List a product in one of the caller's stores.
///
/// `POST /api/v1/stores/:store_id/products`
pub async fn add_product(
    State(state): State<AppState>,
    token: BearerToken,
    Path(store_id): Path<StoreId>,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductCreatedResponse>), AppError> {
    let (product_id, link) = state
        .market
        .add_product(key(token), store_id, product)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductCreatedResponse { product_id, link }),
    ))
}

/// One page of a store's products.
///
/// `GET /api/v1/stores/:store_id/products?start=0&limit=50`
pub async fn list_products(
    State(state): State<AppState>,
    token: BearerToken,
    Path(store_id): Path<StoreId>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    Ok(Json(
        state
            .market
            .list_products(&key(token), &store_id, page.start, limit)
            .await?,
    ))
}

/// A product by id.
///
/// `GET /api/v1/stores/:store_id/products/:product_id`
pub async fn get_product(
    State(state): State<AppState>,
    token: BearerToken,
    Path((store_id, product_id)): Path<(StoreId, ProductId)>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(
        state
            .market
            .get_product(&key(token), &store_id, product_id)
            .await?,
    ))
}

/// The product's link token.
///
/// `GET /api/v1/stores/:store_id/products/:product_id/link`
pub async fn get_product_link(
    State(state): State<AppState>,
    token: BearerToken,
    Path((store_id, product_id)): Path<(StoreId, ProductId)>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state
        .market
        .get_product_link(&key(token), &store_id, product_id)
        .await?;
    Ok(Json(LinkResponse { link }))
}

/// A product by link token.
///
/// `GET /api/v1/stores/:store_id/product-links/:token`
pub async fn get_product_by_link(
    State(state): State<AppState>,
    token: BearerToken,
    Path((store_id, link)): Path<(StoreId, LinkToken)>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(
        state
            .market
            .get_product_by_link(&key(token), &store_id, &link)
            .await?,
    ))
}

// ============================================================================
// Orders
// ============================================================================

/// Place an order.
///
/// `POST /api/v1/orders`
pub async fn create_order(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    token: BearerToken,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), AppError> {
    let span = tracing::info_span!("place_order", correlation_id = %correlation_id.0);
    let order_id = state
        .market
        .create_order(
            key(token),
            request.user_id,
            request.product_id,
            request.quantity,
        )
        .instrument(span)
        .await?;
    Ok((StatusCode::CREATED, Json(OrderCreatedResponse { order_id })))
}

/// An order by id.
///
/// `GET /api/v1/orders/:order_id`
pub async fn get_order(
    State(state): State<AppState>,
    token: BearerToken,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.market.get_order(&key(token), order_id).await?))
}

// ============================================================================
// Categories
// ============================================================================

/// Create a category.
///
/// `POST /api/v1/categories`
pub async fn create_category(
    State(state): State<AppState>,
    token: BearerToken,
    Json(request): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryCreatedResponse>), AppError> {
    let category_id = state
        .market
        .create_category(key(token), request.name, request.description)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryCreatedResponse { category_id }),
    ))
}

/// Every category.
///
/// `GET /api/v1/categories`
pub async fn list_categories(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.market.list_categories(&key(token)).await?))
}

/// A category by id.
///
/// `GET /api/v1/categories/:category_id`
pub async fn get_category(
    State(state): State<AppState>,
    token: BearerToken,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(
        state.market.get_category(&key(token), category_id).await?,
    ))
}

/// Replace a category's name and description.
///
/// `PUT /api/v1/categories/:category_id`
pub async fn update_category(
    State(state): State<AppState>,
    token: BearerToken,
    Path(category_id): Path<CategoryId>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(
        state
            .market
            .update_category(key(token), category_id, request.name, request.description)
            .await?,
    ))
}

/// Delete a category.
///
/// `DELETE /api/v1/categories/:category_id`
pub async fn delete_category(
    State(state): State<AppState>,
    token: BearerToken,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, AppError> {
    state
        .market
        .delete_category(key(token), category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Customer accounts
// ============================================================================

/// Open a user's customer account.
///
/// `POST /api/v1/accounts/:user_id`
pub async fn create_customer_account(
    State(state): State<AppState>,
    token: BearerToken,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    state
        .market
        .create_customer_account(key(token), user_id)
        .await?;
    Ok(StatusCode::CREATED)
}

/// A user's customer account.
///
/// `GET /api/v1/accounts/:user_id`
pub async fn get_customer_account(
    State(state): State<AppState>,
    token: BearerToken,
    Path(user_id): Path<UserId>,
) -> Result<Json<CustomerAccount>, AppError> {
    Ok(Json(
        state
            .market
            .get_customer_account(&key(token), &user_id)
            .await?,
    ))
}

/// Push a product to the front of the wishlist.
///
/// `POST /api/v1/accounts/:user_id/wishlist`
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    token: BearerToken,
    Path(user_id): Path<UserId>,
    Json(request): Json<WishlistRequest>,
) -> Result<StatusCode, AppError> {
    state
        .market
        .add_to_wishlist(key(token), user_id, request.product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Wishlist, most recent first.
///
/// `GET /api/v1/accounts/:user_id/wishlist`
pub async fn get_wishlist(
    State(state): State<AppState>,
    token: BearerToken,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<ProductId>>, AppError> {
    Ok(Json(state.market.get_wishlist(&key(token), &user_id).await?))
}

/// Push an address to the front of the saved addresses.
///
/// `POST /api/v1/accounts/:user_id/addresses`
pub async fn add_saved_address(
    State(state): State<AppState>,
    token: BearerToken,
    Path(user_id): Path<UserId>,
    Json(request): Json<AddressRequest>,
) -> Result<StatusCode, AppError> {
    state
        .market
        .add_saved_address(key(token), user_id, request.address)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Saved addresses, most recent first.
///
/// `GET /api/v1/accounts/:user_id/addresses`
pub async fn get_saved_addresses(
    State(state): State<AppState>,
    token: BearerToken,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(
        state
            .market
            .get_saved_addresses(&key(token), &user_id)
            .await?,
    ))
}

/// Order history, most recent first.
///
/// `GET /api/v1/accounts/:user_id/orders`
pub async fn get_order_history(
    State(state): State<AppState>,
    token: BearerToken,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<OrderId>>, AppError> {
    Ok(Json(
        state
            .market
            .get_order_history(&key(token), &user_id)
            .await?,
    ))
}

// ============================================================================
// Metrics
// ============================================================================

/// Prometheus exposition.
///
/// `GET /metrics`, 404 when metrics are disabled.
#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .ok_or_else(|| AppError::not_found("metrics are disabled"))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
