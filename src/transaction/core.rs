//! Defines the core data model and database queries for transactions.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error, UserID, database_id::TransactionId, db::timestamp_now};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// A text description of what the transaction was for.
    pub name: String,
    /// The amount of money spent or earned in this transaction.
    ///
    /// Positive values are income, negative values are expenses.
    pub amount: f64,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
}

/// The request body for creating or replacing a transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionForm {
    /// A text description of what the transaction was for.
    pub name: String,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: f64,
}

impl TransactionForm {
    /// Trim the name and check that there is something left.
    ///
    /// # Errors
    /// Returns [Error::EmptyTransactionName] if the name is empty or only whitespace.
    fn validated_name(&self) -> Result<&str, Error> {
        let name = self.name.trim();

        if name.is_empty() {
            Err(Error::EmptyTransactionName)
        } else {
            Ok(name)
        }
    }
}

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// Transactions are deleted along with the user that owns them.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_id ON \"transaction\"(user_id);",
        (),
    )?;

    Ok(())
}

/// Record a new transaction for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTransactionName] if the name is empty,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    form: &TransactionForm,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let name = form.validated_name()?;
    let now = timestamp_now();

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, name, amount, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING id, user_id, name, amount, created, updated",
        )?
        .query_row(
            params![user_id.as_i64(), name, form.amount, now],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, amount, created, updated FROM \"transaction\"
             WHERE id = :id AND user_id = :user_id",
        )?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )
        .map_err(map_not_found)
}

/// Retrieve all of the transactions that belong to `user_id`, oldest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, amount, created, updated FROM \"transaction\"
             WHERE user_id = :user_id ORDER BY id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Replace the name and amount of the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTransactionName] if the name is empty,
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    form: &TransactionForm,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let name = form.validated_name()?;

    connection
        .prepare(
            "UPDATE \"transaction\"
             SET name = ?1, amount = ?2, updated = ?3
             WHERE id = ?4 AND user_id = ?5
             RETURNING id, user_id, name, amount, created, updated",
        )?
        .query_row(
            params![name, form.amount, timestamp_now(), id, user_id.as_i64()],
            map_transaction_row,
        )
        .map_err(map_not_found)
}

type RowsAffected = usize;

/// Delete the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected: RowsAffected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    match rows_affected {
        0 => Err(Error::TransactionNotFound),
        _ => Ok(()),
    }
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let name = row.get(2)?;
    let amount = row.get(3)?;
    let created = row.get(4)?;
    let updated = row.get(5)?;

    Ok(Transaction {
        id,
        user_id: UserID::new(raw_user_id),
        name,
        amount,
        created,
        updated,
    })
}

fn map_not_found(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
        error => error.into(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        Error, UserID,
        db::initialize,
        transaction::core::{
            TransactionForm, create_transaction, delete_transaction, get_transaction,
            get_transactions, update_transaction,
        },
    };

    fn get_test_connection() -> (Connection, UserID, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let insert_user = |email: &str| {
            conn.query_row(
                "INSERT INTO user (name, email, password, created, updated)
                 VALUES ('A', ?1, 'hash', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')
                 RETURNING id",
                [email],
                |row| row.get(0).map(UserID::new),
            )
            .unwrap()
        };
        let owner = insert_user("a@x.com");
        let other_user = insert_user("b@x.com");

        (conn, owner, other_user)
    }

    fn form(name: &str, amount: f64) -> TransactionForm {
        TransactionForm {
            name: name.to_owned(),
            amount,
        }
    }

    #[test]
    fn create_succeeds() {
        let (conn, owner, _) = get_test_connection();

        let transaction = create_transaction(owner, &form("  Coffee ", -4.5), &conn).unwrap();

        assert!(transaction.id > 0);
        assert_eq!(transaction.user_id, owner);
        assert_eq!(transaction.name, "Coffee");
        assert_eq!(transaction.amount, -4.5);
        assert_eq!(transaction.created, transaction.updated);
    }

    #[test]
    fn create_fails_on_empty_name() {
        let (conn, owner, _) = get_test_connection();

        let result = create_transaction(owner, &form("   ", 1.0), &conn);

        assert_eq!(result, Err(Error::EmptyTransactionName));
    }

    #[test]
    fn create_fails_on_unknown_user() {
        let (conn, _, _) = get_test_connection();

        let result = create_transaction(UserID::new(999), &form("Coffee", 1.0), &conn);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn get_returns_own_transaction() {
        let (conn, owner, _) = get_test_connection();
        let want = create_transaction(owner, &form("Salary", 1000.0), &conn).unwrap();

        let got = get_transaction(want.id, owner, &conn).unwrap();

        assert_eq!(want, got);
    }

    #[test]
    fn get_hides_other_users_transaction() {
        let (conn, owner, other_user) = get_test_connection();
        let transaction = create_transaction(owner, &form("Salary", 1000.0), &conn).unwrap();

        let result = get_transaction(transaction.id, other_user, &conn);

        assert_eq!(result, Err(Error::TransactionNotFound));
    }

    #[test]
    fn get_fails_on_missing_transaction() {
        let (conn, owner, _) = get_test_connection();

        assert_eq!(
            get_transaction(42, owner, &conn),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn get_all_only_returns_own_transactions_in_order() {
        let (conn, owner, other_user) = get_test_connection();
        let first = create_transaction(owner, &form("First", 1.0), &conn).unwrap();
        create_transaction(other_user, &form("Other", 2.0), &conn).unwrap();
        let second = create_transaction(owner, &form("Second", 3.0), &conn).unwrap();

        let got = get_transactions(owner, &conn).unwrap();

        assert_eq!(got, vec![first, second]);
    }

    #[test]
    fn get_all_is_empty_for_new_user() {
        let (conn, owner, _) = get_test_connection();

        assert_eq!(get_transactions(owner, &conn).unwrap(), vec![]);
    }

    #[test]
    fn update_replaces_name_and_amount() {
        let (conn, owner, _) = get_test_connection();
        let transaction = create_transaction(owner, &form("Coffee", -4.5), &conn).unwrap();

        let updated =
            update_transaction(transaction.id, owner, &form("Tea", -3.0), &conn).unwrap();

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.name, "Tea");
        assert_eq!(updated.amount, -3.0);
        assert_eq!(updated.created, transaction.created);
        assert!(updated.updated >= transaction.updated);
        assert_eq!(get_transaction(transaction.id, owner, &conn), Ok(updated));
    }

    #[test]
    fn update_fails_for_other_user() {
        let (conn, owner, other_user) = get_test_connection();
        let transaction = create_transaction(owner, &form("Coffee", -4.5), &conn).unwrap();

        let result = update_transaction(transaction.id, other_user, &form("Tea", -3.0), &conn);

        assert_eq!(result, Err(Error::TransactionNotFound));
        assert_eq!(get_transaction(transaction.id, owner, &conn), Ok(transaction));
    }

    #[test]
    fn update_fails_on_empty_name() {
        let (conn, owner, _) = get_test_connection();
        let transaction = create_transaction(owner, &form("Coffee", -4.5), &conn).unwrap();

        let result = update_transaction(transaction.id, owner, &form("", -3.0), &conn);

        assert_eq!(result, Err(Error::EmptyTransactionName));
    }

    #[test]
    fn delete_removes_transaction() {
        let (conn, owner, _) = get_test_connection();
        let transaction = create_transaction(owner, &form("Coffee", -4.5), &conn).unwrap();

        delete_transaction(transaction.id, owner, &conn).unwrap();

        assert_eq!(
            get_transaction(transaction.id, owner, &conn),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn delete_fails_for_other_user() {
        let (conn, owner, other_user) = get_test_connection();
        let transaction = create_transaction(owner, &form("Coffee", -4.5), &conn).unwrap();

        let result = delete_transaction(transaction.id, other_user, &conn);

        assert_eq!(result, Err(Error::TransactionNotFound));
        assert!(get_transaction(transaction.id, owner, &conn).is_ok());
    }

    #[test]
    fn deleting_user_deletes_their_transactions() {
        let (conn, owner, _) = get_test_connection();
        create_transaction(owner, &form("Coffee", -4.5), &conn).unwrap();

        conn.execute("DELETE FROM user WHERE id = ?1", [owner.as_i64()])
            .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(id) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
