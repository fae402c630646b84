//! The endpoint for reading the profile of the logged in user.

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use crate::auth::AuthenticatedUser;

/// Respond with the user that made the request.
pub async fn get_current_user(Extension(auth): Extension<AuthenticatedUser>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(auth.user))
}
