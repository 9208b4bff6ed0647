//! Error types for the feed API.
//!
//! [`ApiError`] converts into an Axum response with a JSON body of the
//! form `{"error": ..., "status": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the feed API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No record exists for the requested world.
    #[error("No data for this world")]
    NotFound,

    /// A report lacked `world` or `distracted`.
    #[error("Missing required fields: world, distracted")]
    MissingFields,

    /// The request body or path could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MissingFields | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
