use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use kivu_auth::Permission;
use kivu_infra::Marketplace;
use kivu_orders::ReceiptId;

use crate::app::dto::{PurchaseRequest, ReceiptResponse};
use crate::app::errors;
use crate::authz;
use crate::context::PrincipalContext;

/// Buyer identity always comes from the token, never from the body.
pub async fn submit_purchase(
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

    match marketplace.order_intake().submit_purchase_intent(&intent) {
        Ok(receipt) => (StatusCode::CREATED, Json(ReceiptResponse::from(&receipt))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::ORDERS_READ_OWN) {
        return errors::authz_error_to_response(e);
    }

    let items = marketplace
        .order_intake()
        .receipts_for(principal.user_id())
        .iter()
        .map(ReceiptResponse::from)
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

/// Another buyer's order is reported as absent.
pub async fn get_order(
    Extension(marketplace): Extension<Arc<Marketplace>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(e) = authz::require(&principal, &Permission::ORDERS_READ_OWN) {
        return errors::authz_error_to_response(e);
    }
    let receipt_id = match id.parse::<ReceiptId>() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match marketplace.order_intake().receipt_for(principal.user_id(), receipt_id) {
        Ok(receipt) => (StatusCode::OK, Json(ReceiptResponse::from(&receipt))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
