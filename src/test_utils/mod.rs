#![allow(missing_docs)]

pub(crate) mod http;

use rusqlite::Connection;

use crate::AppState;

pub(crate) use http::{get_test_server, log_in, register};

/// The bcrypt cost used in tests, the lowest bcrypt allows.
pub(crate) const TEST_PASSWORD_COST: u32 = 4;

/// An [AppState] backed by a fresh in-memory database.
pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(connection, "42", "Test API", TEST_PASSWORD_COST)
        .expect("Could not create app state")
}
