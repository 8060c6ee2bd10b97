use axum::{
    Router,
    response::Response,
    routing::{get, post},
};

use kivu_products::ProductId;

use crate::app::errors;

pub mod admin;
pub mod cart;
pub mod products;
pub mod purchases;
pub mod seller;
pub mod system;

/// Catalog endpoints open to anonymous callers.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/products", products::router())
}

/// Endpoints behind the bearer-token middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/seller", seller::router())
        .route("/purchases", post(purchases::submit_purchase))
        .nest("/cart", cart::router())
        .route("/orders", get(purchases::list_orders))
        .route("/orders/:id", get(purchases::get_order))
        .nest("/admin", admin::router())
}

fn parse_product_id(raw: &str) -> Result<ProductId, Response> {
    raw.parse::<ProductId>().map_err(errors::domain_error_to_response)
}
