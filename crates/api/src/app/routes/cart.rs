//! Buyer carts. The cart always belongs to the token's user.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use kivu_auth::Permission;
use kivu_infra::Marketplace;

use crate::app::dto::{CartResponse, PurchaseRequest, ReceiptResponse};
use crate::app::errors;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(view_cart))
        .route("/add", post(add_to_cart))
        .route("/remove/:product_id", delete(remove_from_cart))
        .route("/clear", delete(clear_cart))
        .route("/checkout", post(checkout))
}

pub async fn view_cart(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::PURCHASES_CREATE) {
        return errors::authz_error_to_response(e);
    }
    let cart = marketplace.carts().view(principal.user_id());
    (StatusCode::OK, Json(CartResponse::from(&cart))).into_response()
}

/// Same body as a direct purchase; lines merge by product and purchase type.
pub async fn add_to_cart(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::PURCHASES_CREATE) {
        return errors::authz_error_to_response(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let intent = match body.into_intent(principal.user_id()) {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match marketplace.carts().add(
        intent.buyer_id,
        intent.product_id,
        intent.purchase_type,
        intent.quantity,
    ) {
        Ok(cart) => (StatusCode::OK, Json(CartResponse::from(&cart))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn remove_from_cart(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(product_id): Path<String>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::PURCHASES_CREATE) {
        return errors::authz_error_to_response(e);
    }
    let product_id = match super::parse_product_id(&product_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let cart = marketplace.carts().remove(principal.user_id(), product_id);
    (StatusCode::OK, Json(CartResponse::from(&cart))).into_response()
}

pub async fn clear_cart(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::PURCHASES_CREATE) {
        return errors::authz_error_to_response(e);
    }
    let cart = marketplace.carts().clear(principal.user_id());
    (StatusCode::OK, Json(CartResponse::from(&cart))).into_response()
}

pub async fn checkout(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::PURCHASES_CREATE) {
        return errors::authz_error_to_response(e);
    }
    match marketplace.carts().checkout(principal.user_id()) {
        Ok(receipts) => {
            let items = receipts.iter().map(ReceiptResponse::from).collect::<Vec<_>>();
            (StatusCode::CREATED, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
