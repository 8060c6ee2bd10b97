use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use kivu_auth::AuthzError;
use kivu_core::{DomainError, FieldViolation};
use kivu_infra::command_dispatcher::DispatchError;

pub fn dispatch_error_to_response(err: DispatchError) -> Response {
    match err {
        DispatchError::Domain(e) => domain_error_to_response(e),
        DispatchError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
        DispatchError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            e.to_string(),
        ),
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(violations) => validation_error(message, &violations),
        DomainError::InvalidId(msg) => validation_error(message, &[FieldViolation::new("id", msg)]),
        DomainError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InvalidState { .. } => json_error(StatusCode::CONFLICT, "invalid_state", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
    }
}

pub fn authz_error_to_response(err: AuthzError) -> Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

/// A JSON body axum could not decode (syntax, missing field, wrong type or
/// content type).
pub fn json_rejection_to_response(rejection: JsonRejection) -> Response {
    malformed_input("body", rejection.body_text())
}

pub fn query_rejection_to_response(rejection: QueryRejection) -> Response {
    malformed_input("query", rejection.body_text())
}

/// Request input that could not be decoded at all, reported against `field`.
pub fn malformed_input(field: &str, detail: impl Into<String>) -> Response {
    validation_error(
        format!("malformed request {field}"),
        &[FieldViolation::new(field, detail)],
    )
}

pub fn validation_error(message: impl Into<String>, violations: &[FieldViolation]) -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": message.into(),
            "violations": violations,
        })),
    )
        .into_response()
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
