//! Defines the endpoint for creating a new transaction.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    AuthenticatedUser, Error,
    db::lock_connection,
    transaction::{
        Transaction,
        core::{TransactionForm, TransactionState, create_transaction},
    },
};

/// A route handler for recording a new transaction for the logged in user.
///
/// Responds with the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(auth): Extension<AuthenticatedUser>,
    body: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(form) = body?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction = create_transaction(auth.user.id, &form, &connection)?;
    tracing::debug!(
        "User {} created transaction {}",
        auth.user.id,
        transaction.id
    );

    Ok(Json(transaction))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::get_test_server,
        transaction::test_utils::{logged_in_user, post_transaction},
    };

    #[tokio::test]
    async fn create_returns_stored_transaction() {
        let server = get_test_server();
        let token = logged_in_user(&server, "a@x.com").await;
        let me = server
            .get(endpoints::ME)
            .authorization_bearer(&token)
            .await
            .json::<Value>();

        let transaction = post_transaction(&server, &token, "Coffee", -4.5).await;

        assert!(transaction["id"].as_i64().unwrap() > 0);
        assert_eq!(transaction["user_id"], me["id"]);
        assert_eq!(transaction["name"], "Coffee");
        assert_eq!(transaction["amount"], -4.5);
        assert_eq!(transaction["created"], transaction["updated"]);
    }

    #[tokio::test]
    async fn create_fails_on_empty_name() {
        let server = get_test_server();
        let token = logged_in_user(&server, "a@x.com").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "name": " ", "amount": 1.0 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "transaction name cannot be empty"
        );
    }

    #[tokio::test]
    async fn create_fails_on_invalid_body() {
        let server = get_test_server();
        let token = logged_in_user(&server, "a@x.com").await;

        for body in [
            json!({ "name": "Coffee" }),
            json!({ "amount": 1.0 }),
            json!({ "name": "Coffee", "amount": "a lot" }),
        ] {
            server
                .post(endpoints::TRANSACTIONS)
                .authorization_bearer(&token)
                .json(&body)
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn create_requires_token() {
        let server = get_test_server();

        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({ "name": "Coffee", "amount": 1.0 }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
