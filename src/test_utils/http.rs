//! Helpers for driving the full router in tests.

use axum_test::{TestResponse, TestServer};
use serde_json::{Value, json};

use crate::{build_router, endpoints, test_utils::get_test_app_state};

/// A test server running the full router against a fresh in-memory database.
pub(crate) fn get_test_server() -> TestServer {
    TestServer::try_new(build_router(get_test_app_state())).expect("Could not create test server.")
}

/// Register a user named `name` with `email` and the password "secret1".
///
/// Returns the registration response body.
pub(crate) async fn register(server: &TestServer, name: &str, email: &str) -> Value {
    let response = server
        .post(endpoints::USERS)
        .json(&json!({
            "name": name,
            "email": email,
            "password": "secret1",
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

/// Log in as `email` with the password "secret1" and return the session token.
pub(crate) async fn log_in(server: &TestServer, email: &str) -> String {
    let response: TestResponse = server
        .post(endpoints::LOG_IN)
        .json(&json!({
            "email": email,
            "password": "secret1",
        }))
        .await;

    response.assert_status_ok();
    response.json::<Value>()["token"]
        .as_str()
        .expect("log in response should contain a token")
        .to_owned()
}
