//! Helpers for testing the transaction endpoints.

use axum_test::TestServer;
use serde_json::{Value, json};

use crate::{
    endpoints,
    test_utils::{log_in, register},
};

/// Register and log in a user with `email`, returning their session token.
pub(crate) async fn logged_in_user(server: &TestServer, email: &str) -> String {
    register(server, "A", email).await;
    log_in(server, email).await
}

/// Create a transaction through the API and return the response body.
pub(crate) async fn post_transaction(
    server: &TestServer,
    token: &str,
    name: &str,
    amount: f64,
) -> Value {
    let response = server
        .post(endpoints::TRANSACTIONS)
        .authorization_bearer(token)
        .json(&json!({ "name": name, "amount": amount }))
        .await;

    response.assert_status_ok();
    response.json()
}

/// The path of the transaction in `body`.
pub(crate) fn transaction_path(body: &Value) -> String {
    let id = body["id"].as_i64().expect("transaction should have an ID");

    endpoints::format_endpoint(endpoints::TRANSACTION, id)
}
