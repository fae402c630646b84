//! Purse is a small REST API for tracking personal financial transactions.
//!
//! Users register with a name, email and password, log in to receive a signed
//! session token, and then manage their own transactions with that token.
//! Tokens are JWTs that are also recorded against the user in the database so
//! that they can be revoked by logging out before they expire.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod config;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod not_found;
mod routing;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    AuthenticatedUser, Claims, CredentialStore, MIN_PASSWORD_LENGTH, NewUser, PasswordHash,
    TokenError, TokenService, User, UserID, ValidatedPassword, parse_email,
};
pub use config::AppConfig;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_SIZE, logging_middleware};
pub use routing::build_router;
pub use transaction::Transaction;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty or whitespace-only string was used as a user's name.
    #[error("name cannot be empty")]
    EmptyName,

    /// The string used as an email address is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The password is shorter than [MIN_PASSWORD_LENGTH] characters.
    #[error("password must be at least {min} characters long", min = MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    /// The email address already belongs to a registered user.
    ///
    /// This is detected by the database's UNIQUE constraint so that two
    /// concurrent registrations cannot both succeed.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// An empty or whitespace-only string was used as a transaction name.
    #[error("transaction name cannot be empty")]
    EmptyTransactionName,

    /// The request body was missing, was not JSON or did not have the
    /// expected fields.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The request body was larger than [MAX_REQUEST_BODY_SIZE] bytes or could not be read.
    #[error("request body is too large")]
    RequestBodyTooLarge,

    /// The email and password did not match a registered user.
    ///
    /// Deliberately does not say which of the two was wrong.
    #[error("Login failed, please check your credentials")]
    InvalidCredentials,

    /// The request could not be authenticated with a session token.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The transaction does not exist or belongs to another user.
    ///
    /// The two cases are not distinguished so that users cannot probe for
    /// the IDs of other users' transactions.
    #[error("transaction not found")]
    TransactionNotFound,

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A session token could not be signed.
    #[error("could not create session token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// The HTTP status code a client receives for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyName
            | Error::InvalidEmail(_)
            | Error::PasswordTooShort
            | Error::DuplicateEmail
            | Error::EmptyTransactionName
            | Error::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Error::RequestBodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::InvalidCredentials | Error::Token(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound | Error::TransactionNotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        } else {
            tracing::debug!("Rejecting request with {status}: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
