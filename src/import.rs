//! Bulk loading of transactions from a JSON file, bypassing the HTTP layer.
//!
//! Every record is validated before the store is touched, so a bad file
//! leaves the existing transactions in place.

use std::path::Path;

use serde_json::{Map, Value};

use crate::{
    Error,
    transaction::{NewTransaction, TransactionStore, parse_instant_value},
};

/// The file read by the import script when no path is given.
pub const DEFAULT_IMPORT_FILE: &str = "data/transactions.json";

/// What to do with the transactions that are already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Delete every stored transaction before inserting.
    #[default]
    Replace,
    /// Keep the stored transactions and add the new ones.
    Append,
}

/// The outcome of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// How many transactions were deleted first.
    pub deleted: u64,
    /// How many transactions were inserted.
    pub inserted: u64,
}

/// Parse the contents of an import file into transactions.
///
/// The file must hold a JSON array of objects. Any `id` or `_id` field is
/// dropped since the store assigns its own IDs, and unknown fields are ignored.
///
/// # Errors
/// Returns [Error::Validation] naming the first record that is not a valid
/// transaction.
pub fn parse_records(text: &str) -> Result<Vec<NewTransaction>, Error> {
    let values: Vec<Value> = serde_json::from_str(text).map_err(|error| {
        Error::Validation(format!("expected a JSON array of transactions: {error}"))
    })?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            parse_record(value)
                .map_err(|error| Error::Validation(format!("record {index}: {error}")))
        })
        .collect()
}

fn parse_record(value: Value) -> Result<NewTransaction, Error> {
    let Value::Object(mut record) = value else {
        return Err(Error::Validation(format!("expected an object, got {value}")));
    };

    record.remove("id");
    record.remove("_id");

    let amount = match record.get("amount") {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(Value::Null) | None => {
            return Err(Error::Validation("amount is required".to_owned()));
        }
        Some(_) => None,
    }
    .ok_or_else(|| Error::Validation(format!("amount {} is not a number", record["amount"])))?;

    let date = match record.get("date") {
        Some(Value::Null) | None => return Err(Error::Validation("date is required".to_owned())),
        Some(date) => parse_instant_value(date)?,
    };

    Ok(NewTransaction::new(amount, date)?
        .category(&text_field(&record, "category")?)
        .description(&text_field(&record, "description")?))
}

fn text_field(record: &Map<String, Value>, name: &str) -> Result<String, Error> {
    match record.get(name) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(value.to_string()),
        Some(value) => Err(Error::Validation(format!("{name} {value} is not text"))),
    }
}

/// Read and parse an import file.
///
/// # Errors
/// Returns [Error::Io] if the file cannot be read, or the errors of
/// [parse_records].
pub async fn read_import_file(path: &Path) -> Result<Vec<NewTransaction>, Error> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|error| Error::Io(format!("could not read {}: {error}", path.display())))?;

    parse_records(&text)
}

/// Store `transactions`, first clearing the collection in [ImportMode::Replace].
///
/// Clearing and inserting are separate operations, so a failure during the
/// insert leaves the collection empty or partially filled.
pub async fn run_import(
    store: &dyn TransactionStore,
    transactions: Vec<NewTransaction>,
    mode: ImportMode,
) -> Result<ImportReport, Error> {
    let deleted = match mode {
        ImportMode::Replace => {
            let deleted = store.delete_all().await?;
            tracing::info!("Cleared {deleted} existing transactions");
            deleted
        }
        ImportMode::Append => 0,
    };

    let inserted = store.insert_many(transactions).await?;
    tracing::info!("Successfully inserted {inserted} transactions");

    Ok(ImportReport { deleted, inserted })
}
