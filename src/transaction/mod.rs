//! Transaction management for the REST API.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the body used to create or edit one
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for the transaction endpoints
//!
//! Every query is scoped to the user that owns the transaction.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod view_endpoint;

pub use core::{Transaction, create_transaction_table};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use view_endpoint::{get_transaction_endpoint, get_transactions_endpoint};

#[cfg(test)]
mod test_utils;
