//! Defines the endpoint for fetching a single transaction.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    transaction::{Transaction, TransactionId, TransactionStore},
};

/// A route handler for getting a transaction by its ID.
pub async fn get_transaction_endpoint(
    State(store): State<Arc<dyn TransactionStore>>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, Error> {
    store.get(&TransactionId::new(id)).await.map(Json)
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use serde_json::Value;
    use time::macros::datetime;

    use crate::{
        test_utils::test_state,
        transaction::{NewTransaction, get_transaction_endpoint},
    };

    #[tokio::test]
    async fn gets_transaction_by_id() {
        let state = test_state(vec![
            NewTransaction::new(12.3, datetime!(2024-05-01 00:00 UTC))
                .unwrap()
                .description("Refund"),
        ]);
        let transaction = state
            .transactions
            .query(Default::default())
            .await
            .unwrap()
            .remove(0);
        let app = Router::new()
            .route("/{id}", get(get_transaction_endpoint))
            .with_state(state);
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.get(&format!("/{}", transaction.id)).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["description"], "Refund");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = Router::new()
            .route("/{id}", get(get_transaction_endpoint))
            .with_state(test_state(vec![]));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.get("/65a4f1c2e4b0a1b2c3d4e5f6").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let app = Router::new()
            .route("/{id}", get(get_transaction_endpoint))
            .with_state(test_state(vec![]));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.get("/not-an-id").await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
