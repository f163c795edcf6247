//! Defines the endpoint for creating a new transaction.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    Error,
    extract::JsonOrForm,
    transaction::{NewTransaction, TransactionStore, parse_instant},
};

/// The body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// Positive for income, negative for an expense.
    pub amount: f64,
    /// A label grouping similar transactions.
    #[serde(default)]
    pub category: String,
    /// When the transaction happened, an RFC 3339 date-time or a `YYYY-MM-DD` date.
    pub date: String,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: String,
}

/// A route handler for creating a new transaction, responds with the stored transaction.
pub async fn create_transaction_endpoint(
    State(store): State<Arc<dyn TransactionStore>>,
    JsonOrForm(form): JsonOrForm<TransactionForm>,
) -> Result<Response, Error> {
    let transaction = NewTransaction::new(form.amount, parse_instant(&form.date)?)?
        .category(&form.category)
        .description(&form.description);

    let transaction = store.create(transaction).await?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{test_utils::test_state, transaction::create_transaction_endpoint};

    fn server() -> (TestServer, crate::AppState) {
        let state = test_state(vec![]);
        let app = Router::new()
            .route("/", post(create_transaction_endpoint))
            .with_state(state.clone());

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state,
        )
    }

    #[tokio::test]
    async fn creates_transaction() {
        let (server, state) = server();

        let response = server
            .post("/")
            .json(&json!({
                "amount": -45.99,
                "category": "Food",
                "date": "2025-01-15",
                "description": "Coffee",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["amount"], -45.99);
        assert_eq!(body["date"], "2025-01-15T00:00:00Z");
        assert!(body["_id"].is_string());

        let stored = state
            .transactions
            .count(&Default::default())
            .await
            .unwrap();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn invalid_date_is_bad_request() {
        let (server, _) = server();

        let response = server
            .post("/")
            .json(&json!({ "amount": 10, "date": "not a date" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "could not parse \"not a date\" as a date" }));
    }

    #[tokio::test]
    async fn missing_amount_is_bad_request() {
        let (server, _) = server();

        let response = server.post("/").json(&json!({ "date": "2025-01-15" })).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
