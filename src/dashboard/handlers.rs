//! HTTP handlers for the dashboard.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use crate::{
    Error,
    dashboard::aggregation::{MonthlyTotal, Summary, monthly_totals, summarize},
    transaction::{Transaction, TransactionParams, TransactionQuery, TransactionStore},
};

const DEFAULT_MONTHS: usize = 12;
const DEFAULT_RECENT_LIMIT: u64 = 5;
const MAX_RECENT_LIMIT: u64 = 50;

/// Totals over every transaction that matches the query string filters.
pub async fn get_summary(
    State(store): State<Arc<dyn TransactionStore>>,
    params: Result<Query<TransactionParams>, QueryRejection>,
) -> Result<Json<Summary>, Error> {
    let Query(params) = params?;

    let transactions = store
        .query(TransactionQuery {
            filter: params.filter()?,
            ..Default::default()
        })
        .await?;

    Ok(Json(summarize(&transactions)))
}

/// Query string for [get_monthly].
#[derive(Debug, Deserialize)]
pub struct MonthlyParams {
    /// How many of the latest months with data to include.
    pub months: Option<usize>,
}

/// Income and expenses per month for the latest months with data.
pub async fn get_monthly(
    State(store): State<Arc<dyn TransactionStore>>,
    params: Result<Query<MonthlyParams>, QueryRejection>,
) -> Result<Json<Vec<MonthlyTotal>>, Error> {
    let Query(params) = params?;

    let transactions = store.query(TransactionQuery::default()).await?;

    Ok(Json(monthly_totals(
        &transactions,
        params.months.unwrap_or(DEFAULT_MONTHS),
    )))
}

/// Query string for [get_recent].
#[derive(Debug, Deserialize)]
pub struct RecentParams {
    /// How many transactions to return, at most 50.
    pub limit: Option<u64>,
}

/// The most recent transactions by date.
pub async fn get_recent(
    State(store): State<Arc<dyn TransactionStore>>,
    params: Result<Query<RecentParams>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Query(params) = params?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);

    store
        .query(TransactionQuery {
            limit: Some(limit),
            ..Default::default()
        })
        .await
        .map(Json)
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        dashboard::{get_monthly, get_recent, get_summary},
        test_utils::test_state,
        transaction::NewTransaction,
    };

    fn server() -> TestServer {
        let transactions = vec![
            NewTransaction::new(2000.0, datetime!(2024-01-01 09:00 UTC))
                .unwrap()
                .category("Salary"),
            NewTransaction::new(-100.0, datetime!(2024-01-10 09:00 UTC))
                .unwrap()
                .category("Food"),
            NewTransaction::new(-60.0, datetime!(2024-02-10 09:00 UTC))
                .unwrap()
                .category("Transport"),
        ];
        let app = Router::new()
            .route("/summary", get(get_summary))
            .route("/monthly", get(get_monthly))
            .route("/recent", get(get_recent))
            .with_state(test_state(transactions));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn summary_totals_everything() {
        let response = server().get("/summary").await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["total_income"], 2000.0);
        assert_eq!(body["total_expenses"], 160.0);
        assert_eq!(body["net"], 1840.0);
        assert_eq!(body["transaction_count"], 3);
        assert_eq!(body["categories"][0]["category"], "Salary");
    }

    #[tokio::test]
    async fn summary_respects_date_filter() {
        let response = server()
            .get("/summary")
            .add_query_param("from", "2024-02-01")
            .await;

        assert_eq!(response.json::<Value>()["total_expenses"], 60.0);
    }

    #[tokio::test]
    async fn monthly_is_chronological() {
        let response = server().get("/monthly").await;

        response.assert_json(&json!([
            { "month": "2024-01", "income": 2000.0, "expenses": 100.0, "net": 1900.0 },
            { "month": "2024-02", "income": 0.0, "expenses": 60.0, "net": -60.0 },
        ]));
    }

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let response = server().get("/recent").add_query_param("limit", 2).await;

        let body = response.json::<Value>();
        let amounts: Vec<f64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|transaction| transaction["amount"].as_f64().unwrap())
            .collect();
        assert_eq!(amounts, [-60.0, -100.0]);
    }
}
