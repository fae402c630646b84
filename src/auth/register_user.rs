//! The endpoint for registering a new user.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    Error,
    auth::{AuthState, NewUser},
};

/// A route handler for registering a new user.
///
/// The new user is logged in straight away, so the response contains a
/// session token along with the user.
///
/// Any `admin` field in the request body is ignored, users are never
/// registered as administrators.
pub async fn register_user(
    State(state): State<AuthState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(new_user) = body?;

    let mut user = state.credential_store.create(new_user)?;
    let token = state.token_service.issue(&user)?;
    state.credential_store.add_token(&mut user, &token)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "msg": "add user successful",
            "user": user,
            "token": token,
        })),
    ))
}
