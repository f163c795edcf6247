//! The response for requests that match no route.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The fallback handler for unknown routes.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// A JSON 404 response for unknown routes.
pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
        .into_response()
}
