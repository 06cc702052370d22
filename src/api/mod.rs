pub mod auth;
mod bids;
mod error;
mod products;
mod validation;

pub use error::{ApiError, ErrorCode, ErrorResponse};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (signup/login/logout public, /me resolves the cookie)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    // Product and bid routes; write endpoints authenticate via the
    // CurrentUser extractor
    let product_routes = Router::new()
        .route("/products", get(products::list_products))
        .route("/products", post(products::create_product))
        .route("/products/:id", get(products::get_product))
        .route("/products/:id/bids", get(bids::list_bids))
        .route("/products/:id/bids", post(bids::place_bid));

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .merge(product_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
