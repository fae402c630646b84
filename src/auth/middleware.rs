//! Authentication middleware that only lets through requests with a valid, unrevoked session token.

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState, Error,
    auth::{CredentialStore, TokenError, TokenService, User},
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// Verifies the signature and expiry of session tokens.
    pub token_service: TokenService,
    /// Loads the user a token was issued to.
    pub credential_store: CredentialStore,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_service: state.token_service.clone(),
            credential_store: state.credential_store.clone(),
        }
    }
}

/// The user that sent the request and the session token they sent it with.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The user loaded from the database.
    pub user: User,
    /// The raw session token from the authorization header.
    pub token: String,
}

/// Middleware function that checks for a valid bearer token.
///
/// The token must have a valid signature, must not have expired, must belong
/// to an existing user and must still be in that user's list of active
/// tokens. If so, an [AuthenticatedUser] is placed into the request and the
/// request is executed normally, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(auth): Extension<AuthenticatedUser>` to receive the user.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let authenticated_user = match authenticate(&state, &mut parts).await {
        Ok(authenticated_user) => authenticated_user,
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", parts.uri.path());
            return error.into_response();
        }
    };

    parts.extensions.insert(authenticated_user);
    next.run(Request::from_parts(parts, body)).await
}

async fn authenticate(state: &AuthState, parts: &mut Parts) -> Result<AuthenticatedUser, Error> {
    let token = extract_bearer_token(parts).await?;

    let claims = state.token_service.verify(&token)?;

    let user = match state.credential_store.find_by_id(claims.user_id) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::warn!("Token presented for unknown user {}", claims.user_id);
            return Err(TokenError::UnknownUser.into());
        }
        Err(error) => return Err(error),
    };

    if !user.tokens.iter().any(|active_token| *active_token == token) {
        return Err(TokenError::Revoked.into());
    }

    Ok(AuthenticatedUser { user, token })
}

async fn extract_bearer_token(parts: &mut Parts) -> Result<String, TokenError> {
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| TokenError::Missing)?;

    let token = bearer.token().trim();

    if token.is_empty() {
        Err(TokenError::Missing)
    } else {
        Ok(token.to_owned())
    }
}
