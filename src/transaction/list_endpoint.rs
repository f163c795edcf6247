//! Endpoints for listing transactions and their categories.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Serialize;

use crate::{
    Error,
    pagination::{Pagination, PaginationConfig},
    transaction::{Transaction, TransactionParams, TransactionQuery, TransactionStore},
};

/// A page of transactions.
#[derive(Debug, Serialize)]
pub struct TransactionPage {
    /// The transactions on this page.
    pub transactions: Vec<Transaction>,
    /// Where this page sits among all matching transactions.
    pub pagination: Pagination,
}

/// List transactions matching the query string filters, one page at a time.
pub async fn list_transactions_endpoint(
    State(store): State<Arc<dyn TransactionStore>>,
    State(config): State<PaginationConfig>,
    params: Result<Query<TransactionParams>, QueryRejection>,
) -> Result<Json<TransactionPage>, Error> {
    let Query(params) = params?;
    let filter = params.filter()?;

    let total = store.count(&filter).await?;
    let pagination = Pagination::new(params.page, params.limit, total, &config);

    let transactions = store
        .query(TransactionQuery {
            filter,
            sort: params.sort.unwrap_or_default(),
            skip: pagination.offset(),
            limit: Some(pagination.limit),
        })
        .await?;

    Ok(Json(TransactionPage {
        transactions,
        pagination,
    }))
}

/// List the distinct categories in use.
pub async fn list_categories_endpoint(
    State(store): State<Arc<dyn TransactionStore>>,
) -> Result<Json<Vec<String>>, Error> {
    store.categories().await.map(Json)
}
