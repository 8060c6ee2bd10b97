//! Public catalog: approved products only.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use kivu_core::DomainError;
use kivu_infra::Marketplace;

use crate::app::dto::{self, ListQuery, ProductResponse};
use crate::app::errors;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/categories", get(list_categories))
        .route("/:id", get(get_product))
}

pub async fn list_products(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let items = marketplace.catalog().list_approved(&filter);
    (StatusCode::OK, Json(dto::products_to_json(&items))).into_response()
}

pub async fn list_categories(Extension(marketplace): Extension<Arc<Marketplace>>) -> Response {
    let categories = marketplace.catalog().derived_categories();
    (StatusCode::OK, Json(serde_json::json!({ "items": categories }))).into_response()
}

/// Unapproved products are reported as absent here; moderators use the admin view.
pub async fn get_product(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Path(id): Path<String>,
) -> Response {
    let product_id = match super::parse_product_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match marketplace.catalog().get_by_id(product_id) {
        Ok(p) if p.is_approved() => (StatusCode::OK, Json(ProductResponse::from(&p))).into_response(),
        Ok(_) => errors::domain_error_to_response(DomainError::not_found("product", product_id)),
        Err(e) => errors::domain_error_to_response(e),
    }
}
