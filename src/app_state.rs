//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    AppConfig, Error,
    auth::{CredentialStore, TokenService},
    db::initialize,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Issues and verifies session tokens.
    pub token_service: TokenService,

    /// Persists users, their password hashes and their active session tokens.
    pub credential_store: CredentialStore,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `token_secret` is used to sign session tokens and `issuer` is the tag embedded in them.
    /// `password_cost` is the bcrypt cost used when hashing passwords.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        issuer: &str,
        password_cost: u32,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            token_service: TokenService::new(token_secret, issuer),
            credential_store: CredentialStore::new(connection.clone(), password_cost)?,
            db_connection: connection,
        })
    }

    /// Create a new [AppState] from the process-wide configuration.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn from_config(db_connection: Connection, config: &AppConfig) -> Result<Self, Error> {
        Self::new(
            db_connection,
            &config.token_secret,
            &config.issuer,
            config.password_cost,
        )
    }
}

impl FromRef<AppState> for CredentialStore {
    fn from_ref(state: &AppState) -> Self {
        state.credential_store.clone()
    }
}
