//! Database setup and helpers shared by the models stored in SQLite.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::{create_user_table, create_user_token_table},
    transaction::create_transaction_table,
};

/// Create the tables for all of the domain models.
///
/// This function is idempotent and can be called on an existing database.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_user_token_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the database lock.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub(crate) fn lock_connection(
    connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("Could not acquire the database lock: {error}");
        Error::DatabaseLockError
    })
}

/// The current UTC time truncated to whole seconds, the precision timestamps are stored with.
pub(crate) fn timestamp_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now - time::Duration::nanoseconds(now.nanosecond().into())
}
