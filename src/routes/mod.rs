use axum::{Router, extract::DefaultBodyLimit};

use crate::state::AppState;

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod upload;
pub mod vendor;

// Build the API router without binding state; it will be provided at the top level.
// Routers taking multipart uploads get `max_upload_bytes` instead of the default body limit.
pub fn create_api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
        .nest(
            "/vendor",
            vendor::router().layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .nest(
            "/account",
            account::router().layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}
