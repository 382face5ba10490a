//! HTTP API for notification senders.
//!
//! Responses use the service-wide JSON envelope:
//! `{"success": true, "data": ...}` or
//! `{"success": false, "error": CODE, "message": text}`.

pub mod notify;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use notifyhub_core::error::{ClientCode, NotifyError};

/// HTTP-facing wrapper so core errors can become responses.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub NotifyError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = match code {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
            ClientCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "success": false,
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Wrap `data` in a success envelope.
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}
