//! Defines the endpoint for replacing the name and amount of a transaction.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    AuthenticatedUser, Error,
    database_id::TransactionId,
    db::lock_connection,
    transaction::{
        Transaction,
        core::{TransactionForm, TransactionState, update_transaction},
    },
};

/// A route handler for replacing the name and amount of one of the logged in user's transactions.
///
/// Responds with the updated transaction, or 404 if the transaction belongs to someone else.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<TransactionId>,
    body: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(form) = body?;
    let connection = lock_connection(&state.db_connection)?;

    update_transaction(transaction_id, auth.user.id, &form, &connection).map(Json)
}
