//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{
    AuthenticatedUser, Error,
    database_id::TransactionId,
    db::lock_connection,
    transaction::core::{TransactionState, delete_transaction},
};

/// A route handler for deleting one of the logged in user's transactions.
///
/// Responds with 404 if the transaction belongs to someone else.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_transaction(transaction_id, auth.user.id, &connection)?;
    tracing::debug!(
        "User {} deleted transaction {transaction_id}",
        auth.user.id
    );

    Ok(Json(json!({ "message": "Transaction deleted!" })))
}
