//! Signed session tokens: issuing them for a user and verifying them on the way back in.

use std::fmt::Debug;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, User, UserID};

// Code in this module is adapted from https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

/// The contents of a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub user_id: UserID,
    /// The user's email address when the token was issued.
    pub email: String,
    /// Whether the user was an administrator when the token was issued.
    pub admin: bool,
    /// The service that issued the token.
    pub iss: String,
    /// The time the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// The expiry time of the token, in seconds since the Unix epoch.
    pub exp: i64,
    /// A random ID so that no two tokens are the same string.
    pub jti: String,
}

/// The ways a request can fail to authenticate with a session token.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// The request did not have a bearer token in the authorization header.
    #[error("missing bearer token")]
    Missing,

    /// The token's signature, issuer or algorithm did not check out.
    #[error("invalid token")]
    Invalid,

    /// The token was valid but has expired.
    #[error("token has expired")]
    Expired,

    /// The token could not be parsed.
    #[error("malformed token")]
    Malformed,

    /// The token was issued to a user that no longer exists.
    #[error("token belongs to an unknown user")]
    UnknownUser,

    /// The token has been revoked by logging out.
    #[error("token has been revoked")]
    Revoked,
}

/// Issues and verifies session tokens signed with a server-held secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetime: Duration,
}

impl TokenService {
    /// How long a token is valid for after it is issued.
    pub const DEFAULT_LIFETIME: Duration = Duration::hours(2);

    /// Create a token service that signs tokens with `secret` and tags them with `issuer`.
    pub fn new(secret: &str, issuer: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            issuer: issuer.to_owned(),
            lifetime: Self::DEFAULT_LIFETIME,
        }
    }

    /// Issue a signed token for `user` that expires [TokenService::DEFAULT_LIFETIME] from now.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue(&self, user: &User) -> Result<String, Error> {
        self.issue_at(user, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user: &User,
        issued_at: OffsetDateTime,
    ) -> Result<String, Error> {
        let claims = Claims {
            user_id: user.id,
            email: user.email.to_string(),
            admin: user.admin,
            iss: self.issuer.clone(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + self.lifetime).unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| Error::TokenCreation(error.to_string()))
    }

    /// Check the signature, expiry and issuer of `token` and return its claims.
    ///
    /// This does not check whether the token has been revoked.
    ///
    /// # Errors
    ///
    /// Returns [TokenError::Expired] if the token has expired, [TokenError::Malformed]
    /// if the token cannot be parsed, and [TokenError::Invalid] for anything else.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|error| match error.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_)
                | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed,
                _ => TokenError::Invalid,
            })
    }
}

impl Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
