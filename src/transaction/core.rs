//! Defines the core data models for transactions and how dates are read from clients.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::Error;

// ============================================================================
// MODELS
// ============================================================================

/// The store-assigned ID of a transaction, the hex string of a MongoDB ObjectId.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap an ID string. No validation is done until the ID is used in a query.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, insert a [NewTransaction] into a
/// [TransactionStore](crate::transaction::TransactionStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    #[serde(rename = "_id")]
    pub id: TransactionId,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: f64,
    /// A label grouping similar transactions, e.g. "Groceries".
    pub category: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// A text description of what the transaction was for.
    pub description: String,
}

/// A transaction that has been validated but not yet stored.
///
/// # Examples
///
/// ```
/// use time::macros::datetime;
///
/// use loopr_backend::transaction::NewTransaction;
///
/// let transaction = NewTransaction::new(-45.99, datetime!(2025-01-15 09:30 UTC))
///     .unwrap()
///     .category("Food")
///     .description("Coffee shop purchase");
///
/// assert_eq!(transaction.category, "Food");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Positive values represent income, negative values represent expenses.
    pub amount: f64,
    /// Defaults to an empty string.
    pub category: String,
    /// When the money moved, not when it was recorded.
    pub date: OffsetDateTime,
    /// Defaults to an empty string.
    pub description: String,
}

impl NewTransaction {
    /// Create a new transaction with an empty category and description.
    ///
    /// # Errors
    /// Returns [Error::Validation] if `amount` is NaN or infinite.
    pub fn new(amount: f64, date: OffsetDateTime) -> Result<Self, Error> {
        if !amount.is_finite() {
            return Err(Error::Validation(format!(
                "amount must be a finite number, got {amount}"
            )));
        }

        Ok(Self {
            amount,
            category: String::new(),
            date,
            description: String::new(),
        })
    }

    /// Set the category label.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.trim().to_owned();
        self
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Attach the ID assigned by the store.
    pub(crate) fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            amount: self.amount,
            category: self.category,
            date: self.date,
            description: self.description,
        }
    }
}

// ============================================================================
// DATES
// ============================================================================

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const NAIVE_DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Parse a calendar instant from text.
///
/// Accepts RFC 3339 date-times, date-times without an offset (read as UTC)
/// and plain `YYYY-MM-DD` dates (midnight UTC).
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` matches none of these forms.
pub fn parse_instant(text: &str) -> Result<OffsetDateTime, Error> {
    let text = text.trim();

    if let Ok(instant) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(instant);
    }

    if let Ok(date_time) = PrimitiveDateTime::parse(text, NAIVE_DATE_TIME_FORMAT) {
        return Ok(date_time.assume_utc());
    }

    Date::parse(text, DATE_FORMAT)
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// Parse a calendar instant from a JSON value.
///
/// Strings are read with [parse_instant], numbers as milliseconds since the
/// Unix epoch.
///
/// # Errors
/// Returns [Error::InvalidDate] for any other value or an out of range number.
pub fn parse_instant_value(value: &Value) -> Result<OffsetDateTime, Error> {
    match value {
        Value::String(text) => parse_instant(text),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| from_unix_millis(millis).ok())
            .ok_or_else(|| Error::InvalidDate(number.to_string())),
        other => Err(Error::InvalidDate(other.to_string())),
    }
}

/// Convert milliseconds since the Unix epoch to an instant.
///
/// # Errors
/// Returns [Error::InvalidDate] if `millis` is outside the supported range.
pub fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|_| Error::InvalidDate(millis.to_string()))
}

/// Convert an instant to whole milliseconds since the Unix epoch.
pub fn to_unix_millis(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}
