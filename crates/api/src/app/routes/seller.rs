use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use kivu_auth::Permission;
use kivu_infra::Marketplace;

use crate::app::dto::{self, ProductResponse, SubmitProductRequest};
use crate::app::errors;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/products", get(list_own_products).post(submit_product))
}

pub async fn submit_product(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<SubmitProductRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::PRODUCTS_SUBMIT) {
        return errors::authz_error_to_response(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match marketplace.catalog().submit(principal.user_id(), draft) {
        Ok(product) => (StatusCode::CREATED, Json(ProductResponse::from(&product))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_own_products(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::PRODUCTS_READ_OWN) {
        return errors::authz_error_to_response(e);
    }

    let items = marketplace.catalog().list_by_seller(principal.user_id());
    (StatusCode::OK, Json(dto::products_to_json(&items))).into_response()
}
