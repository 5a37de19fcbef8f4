//! Router configuration for the marketplace API.

use crate::handlers::{self, AppState};
use axum::{
    Router,
    routing::{get, post},
};
use bazaar_web::handlers::{health_check, readiness};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `/health`, `/health/ready`: liveness and readiness (no key)
/// - `/metrics`: Prometheus exposition (no key)
/// - `/api/v1/...`: marketplace operations (bearer key)
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Users
        .route("/users", post(handlers::create_user))
        .route("/users/me", get(handlers::get_me))
        .route("/users/:user_id/balance", post(handlers::add_user_balance))
        // Stores
        .route(
            "/stores",
            post(handlers::create_store).get(handlers::list_stores),
        )
        .route("/stores/:store_id/link", get(handlers::get_store_link))
        .route("/store-links/:token", get(handlers::get_store_by_link))
        // Products
        .route(
            "/stores/:store_id/products",
            post(handlers::add_product).get(handlers::list_products),
        )
        .route(
            "/stores/:store_id/products/:product_id",
            get(handlers::get_product),
        )
        .route(
            "/stores/:store_id/products/:product_id/link",
            get(handlers::get_product_link),
        )
        .route(
            "/stores/:store_id/product-links/:token",
            get(handlers::get_product_by_link),
        )
        // Orders
        .route("/orders", post(handlers::create_order))
        .route("/orders/:order_id", get(handlers::get_order))
        // Categories
        .route(
            "/categories",
            post(handlers::create_category).get(handlers::list_categories),
        )
        .route(
            "/categories/:category_id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        // Customer accounts
        .route(
            "/accounts/:user_id",
            post(handlers::create_customer_account).get(handlers::get_customer_account),
        )
        .route(
            "/accounts/:user_id/wishlist",
            post(handlers::add_to_wishlist).get(handlers::get_wishlist),
        )
        .route(
            "/accounts/:user_id/addresses",
            post(handlers::add_saved_address).get(handlers::get_saved_addresses),
        )
        .route(
            "/accounts/:user_id/orders",
            get(handlers::get_order_history),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness::<AppState>))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
