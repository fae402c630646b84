//! Defines the endpoints for reading one or all of a user's transactions.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    AuthenticatedUser, Error,
    database_id::TransactionId,
    db::lock_connection,
    transaction::{
        Transaction,
        core::{TransactionState, get_transaction, get_transactions},
    },
};

/// A route handler that responds with all of the logged in user's transactions.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transactions(auth.user.id, &connection).map(Json)
}

/// A route handler that responds with a single transaction of the logged in user.
///
/// Responds with 404 if the transaction belongs to someone else.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, auth.user.id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::get_test_server,
        transaction::test_utils::{logged_in_user, post_transaction, transaction_path},
    };

    #[tokio::test]
    async fn list_is_empty_for_new_user() {
        let server = get_test_server();
        let token = logged_in_user(&server, "a@x.com").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn list_returns_own_transactions() {
        let server = get_test_server();
        let token = logged_in_user(&server, "a@x.com").await;
        let first = post_transaction(&server, &token, "Coffee", -4.5).await;
        let second = post_transaction(&server, &token, "Salary", 1000.0).await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([first, second]));
    }

    #[tokio::test]
    async fn list_never_includes_other_users_transactions() {
        let server = get_test_server();
        let token_x = logged_in_user(&server, "x@x.com").await;
        let token_y = logged_in_user(&server, "y@x.com").await;
        post_transaction(&server, &token_x, "Coffee", -4.5).await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token_y)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn get_returns_own_transaction() {
        let server = get_test_server();
        let token = logged_in_user(&server, "a@x.com").await;
        let transaction = post_transaction(&server, &token, "Coffee", -4.5).await;

        let response = server
            .get(&transaction_path(&transaction))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        response.assert_json(&transaction);
    }

    #[tokio::test]
    async fn get_other_users_transaction_is_not_found() {
        let server = get_test_server();
        let token_x = logged_in_user(&server, "x@x.com").await;
        let token_y = logged_in_user(&server, "y@x.com").await;
        let transaction = post_transaction(&server, &token_x, "Coffee", -4.5).await;

        let response = server
            .get(&transaction_path(&transaction))
            .authorization_bearer(&token_y)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "transaction not found");
    }

    #[tokio::test]
    async fn get_missing_transaction_is_not_found() {
        let server = get_test_server();
        let token = logged_in_user(&server, "a@x.com").await;

        server
            .get(&endpoints::format_endpoint(endpoints::TRANSACTION, 1337))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transactions_require_token() {
        let server = get_test_server();

        server
            .get(endpoints::TRANSACTIONS)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get(&endpoints::format_endpoint(endpoints::TRANSACTION, 1))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
