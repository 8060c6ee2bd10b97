//! Moderation and back-office views. Every handler first obtains the
//! moderator capability from the request principal.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use kivu_auth::ModeratorCapability;
use kivu_infra::Marketplace;

use crate::app::dto::{self, HistoryEntry, ProductResponse, RejectRequest};
use crate::app::errors;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/products", get(list_all))
        .route("/products/pending", get(list_pending))
        .route("/products/:id", get(get_product))
        .route("/products/:id/history", get(history))
        .route("/products/:id/approve", post(approve))
        .route("/products/:id/reject", post(reject))
}

fn capability(principal: &PrincipalContext) -> Result<ModeratorCapability, Response> {
    authz::moderator(principal).map_err(errors::authz_error_to_response)
}

pub async fn stats(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = capability(&principal) {
        return res;
    }
    (StatusCode::OK, Json(marketplace.catalog().moderation_summary())).into_response()
}

pub async fn list_all(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = capability(&principal) {
        return res;
    }
    let items = marketplace.catalog().list_all();
    (StatusCode::OK, Json(dto::products_to_json(&items))).into_response()
}

pub async fn list_pending(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = capability(&principal) {
        return res;
    }
    let items = marketplace.catalog().list_pending();
    (StatusCode::OK, Json(dto::products_to_json(&items))).into_response()
}

pub async fn get_product(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = capability(&principal) {
        return res;
    }
    let product_id = match super::parse_product_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match marketplace.catalog().get_by_id(product_id) {
        Ok(p) => (StatusCode::OK, Json(ProductResponse::from(&p))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn history(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = capability(&principal) {
        return res;
    }
    let product_id = match super::parse_product_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match marketplace.catalog().history(product_id) {
        Ok(events) => {
            let items = events.iter().map(HistoryEntry::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn approve(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let cap = match capability(&principal) {
        Ok(c) => c,
        Err(res) => return res,
    };
    let product_id = match super::parse_product_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match marketplace.moderation().approve(&cap, product_id) {
        Ok(p) => (StatusCode::OK, Json(ProductResponse::from(&p))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// The body is optional; no body or `{}` rejects without a reason. A body that
/// is not valid JSON is refused and the product stays pending.
pub async fn reject(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let cap = match capability(&principal) {
        Ok(c) => c,
        Err(res) => return res,
    };
    let product_id = match super::parse_product_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let reason = match RejectRequest::reason_from_body(&body) {
        Ok(r) => r,
        Err(e) => return errors::malformed_input("body", e.to_string()),
    };
    match marketplace.moderation().reject(&cap, product_id, reason) {
        Ok(p) => (StatusCode::OK, Json(ProductResponse::from(&p))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
