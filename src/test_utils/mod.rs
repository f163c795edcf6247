#![allow(missing_docs)]

pub(crate) mod http;
mod stores;

pub(crate) use http::{assert_content_type, get_header};
pub(crate) use stores::{InMemoryTransactionStore, InMemoryUserStore};

use std::sync::Arc;

use crate::{AppState, config::Environment, transaction::NewTransaction};

/// Build app state over in-memory stores holding `transactions`.
pub(crate) fn test_state(transactions: Vec<NewTransaction>) -> AppState {
    AppState {
        password_cost: 4,
        ..AppState::new(
            Environment::Development,
            None,
            Arc::new(InMemoryTransactionStore::with_transactions(transactions)),
            Arc::new(InMemoryUserStore::default()),
            "foobar",
        )
    }
}
