//! The fallback for requests that do not match a route.

use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Fallback handler for requests that do not match any route.
pub async fn get_404_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {}", uri.path());

    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no route for {}", uri.path()) })),
    )
        .into_response()
}
