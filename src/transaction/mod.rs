//! Transactions: the core model, its storage and the endpoints that expose it.

mod core;
mod create_endpoint;
mod get_endpoint;
mod list_endpoint;
mod query;
mod store;

pub use core::{
    NewTransaction, Transaction, TransactionId, from_unix_millis, parse_instant,
    parse_instant_value, to_unix_millis,
};
pub use create_endpoint::{TransactionForm, create_transaction_endpoint};
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::{TransactionPage, list_categories_endpoint, list_transactions_endpoint};
pub use query::{SortOrder, TransactionFilter, TransactionParams, TransactionQuery};
pub use store::{MongoTransactionStore, TRANSACTION_COLLECTION, TransactionStore};

pub(crate) use store::parse_object_id;
