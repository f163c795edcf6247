//! Endpoints for downloading transactions as CSV or JSON files.

use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use time::format_description::well_known::Rfc3339;

use crate::{
    Error,
    transaction::{SortOrder, Transaction, TransactionParams, TransactionQuery, TransactionStore},
};

/// The header row of exported CSV files.
pub const CSV_HEADER: [&str; 5] = ["id", "date", "amount", "category", "description"];

/// Write `transactions` as CSV with a header row.
///
/// # Errors
/// Returns [Error::Internal] if a date cannot be formatted or the writer fails.
pub fn write_csv(transactions: &[Transaction]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_error = |error: csv::Error| Error::Internal(format!("could not write CSV: {error}"));

    writer.write_record(CSV_HEADER).map_err(to_error)?;

    for transaction in transactions {
        let date = transaction
            .date
            .format(&Rfc3339)
            .map_err(|error| Error::Internal(format!("could not format date: {error}")))?;

        writer
            .write_record([
                transaction.id.as_str(),
                date.as_str(),
                transaction.amount.to_string().as_str(),
                transaction.category.as_str(),
                transaction.description.as_str(),
            ])
            .map_err(to_error)?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::Internal(format!("could not flush CSV: {error}")))
}

async fn fetch_for_export(
    store: &dyn TransactionStore,
    params: Result<Query<TransactionParams>, QueryRejection>,
) -> Result<Vec<Transaction>, Error> {
    let Query(params) = params?;

    store
        .query(TransactionQuery {
            filter: params.filter()?,
            sort: params.sort.unwrap_or(SortOrder::Descending),
            ..Default::default()
        })
        .await
}

/// Download the matching transactions as `transactions.csv`, newest first.
pub async fn export_csv(
    State(store): State<Arc<dyn TransactionStore>>,
    params: Result<Query<TransactionParams>, QueryRejection>,
) -> Result<Response, Error> {
    let transactions = fetch_for_export(store.as_ref(), params).await?;
    let body = write_csv(&transactions)?;

    tracing::info!("exported {} transactions as CSV", transactions.len());

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"transactions.csv\""),
        ],
        body,
    )
        .into_response())
}

/// Download the matching transactions as `transactions.json`, newest first.
pub async fn export_json(
    State(store): State<Arc<dyn TransactionStore>>,
    params: Result<Query<TransactionParams>, QueryRejection>,
) -> Result<Response, Error> {
    let transactions = fetch_for_export(store.as_ref(), params).await?;
    let body = serde_json::to_vec_pretty(&transactions)
        .map_err(|error| Error::Internal(format!("could not serialize transactions: {error}")))?;

    tracing::info!("exported {} transactions as JSON", transactions.len());

    Ok((
        [
            (CONTENT_TYPE, "application/json"),
            (CONTENT_DISPOSITION, "attachment; filename=\"transactions.json\""),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use serde_json::Value;
    use time::macros::datetime;

    use crate::{
        export::{export_csv, export_json},
        test_utils::{assert_content_type, get_header, test_state},
        transaction::NewTransaction,
    };

    fn server() -> TestServer {
        let transactions = vec![
            NewTransaction::new(-4.5, datetime!(2024-01-02 08:00 UTC))
                .unwrap()
                .category("Food")
                .description("Coffee, large"),
            NewTransaction::new(1500.0, datetime!(2024-01-31 00:00 UTC))
                .unwrap()
                .category("Salary")
                .description("January pay"),
        ];
        let app = Router::new()
            .route("/csv", get(export_csv))
            .route("/json", get(export_json))
            .with_state(test_state(transactions));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn exports_csv_newest_first() {
        let response = server().get("/csv").await;

        response.assert_status_ok();
        assert_content_type(&response, "text/csv; charset=utf-8");
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"transactions.csv\""
        );

        let text = response.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,date,amount,category,description");
        assert!(lines[1].ends_with(",2024-01-31T00:00:00Z,1500,Salary,January pay"));
        assert!(lines[2].ends_with(",2024-01-02T08:00:00Z,-4.5,Food,\"Coffee, large\""));
    }

    #[tokio::test]
    async fn exports_filtered_json() {
        let response = server()
            .get("/json")
            .add_query_param("category", "Food")
            .await;

        response.assert_status_ok();
        assert_content_type(&response, "application/json");
        let body = response.json::<Value>();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["description"], "Coffee, large");
    }
}
