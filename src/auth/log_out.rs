//! Endpoints for ending one or all of a user's sessions.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    Error,
    auth::{AuthenticatedUser, CredentialStore},
};

/// Invalidate the session token the request was made with.
///
/// Other sessions of the same user, e.g. on other devices, stay logged in.
pub async fn post_log_out(
    State(credential_store): State<CredentialStore>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, Error> {
    let AuthenticatedUser { mut user, token } = auth;

    credential_store.remove_token(&mut user, &token)?;
    tracing::info!("User {} logged out", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "log out successful" })),
    ))
}

/// Invalidate every session token of the user that made the request.
pub async fn post_log_out_all(
    State(credential_store): State<CredentialStore>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, Error> {
    let mut user = auth.user;

    credential_store.clear_tokens(&mut user)?;
    tracing::info!("User {} logged out of all sessions", user.id);

    Ok((
        StatusCode::OK,
        Json(json!({ "msg": "log out all successful" })),
    ))
}
