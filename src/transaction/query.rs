//! Describes which transactions a store query should return and how to read
//! that description from a query string.

use serde::Deserialize;
use time::{Date, OffsetDateTime, macros::time};

use crate::{
    Error,
    transaction::{Transaction, core::parse_instant},
};

/// The order to sort transactions by date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SortOrder {
    /// Oldest first.
    #[serde(rename = "asc")]
    Ascending,
    /// Newest first.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

/// Restricts which transactions are returned.
///
/// Every field that is `Some` must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Exact category label.
    pub category: Option<String>,
    /// Earliest date, inclusive.
    pub from: Option<OffsetDateTime>,
    /// Latest date, inclusive.
    pub to: Option<OffsetDateTime>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Whether `transaction` satisfies every condition of the filter.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.category
            .as_ref()
            .is_none_or(|category| &transaction.category == category)
            && self.from.is_none_or(|from| transaction.date >= from)
            && self.to.is_none_or(|to| transaction.date <= to)
            && self.search.as_ref().is_none_or(|search| {
                transaction
                    .description
                    .to_lowercase()
                    .contains(&search.to_lowercase())
            })
    }
}

/// Defines how transactions should be fetched from a
/// [TransactionStore](crate::transaction::TransactionStore).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Which transactions to include.
    pub filter: TransactionFilter,
    /// Order by date, ties broken by newest ID first.
    pub sort: SortOrder,
    /// How many matching transactions to skip.
    pub skip: u64,
    /// Selects up to the first N transactions after skipping. None returns all.
    pub limit: Option<u64>,
}

/// Query string parameters shared by the transaction list and export endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionParams {
    /// Only include transactions with this category.
    pub category: Option<String>,
    /// Only include transactions on or after this date.
    pub from: Option<String>,
    /// Only include transactions on or before this date. A plain date
    /// includes the whole day.
    pub to: Option<String>,
    /// Only include transactions whose description contains this text.
    pub search: Option<String>,
    /// Date order, `asc` or `desc`.
    pub sort: Option<SortOrder>,
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The number of transactions per page.
    pub limit: Option<u64>,
}

impl TransactionParams {
    /// Build the filter described by the parameters, ignoring blank values.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if `from` or `to` is not a date.
    pub fn filter(&self) -> Result<TransactionFilter, Error> {
        Ok(TransactionFilter {
            category: non_blank(&self.category).map(str::to_owned),
            from: non_blank(&self.from).map(parse_instant).transpose()?,
            to: non_blank(&self.to).map(parse_upper_bound).transpose()?,
            search: non_blank(&self.search).map(str::to_owned),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Parse an inclusive upper bound, extending plain dates to the end of the day.
fn parse_upper_bound(text: &str) -> Result<OffsetDateTime, Error> {
    match Date::parse(text, time::macros::format_description!("[year]-[month]-[day]")) {
        Ok(date) => Ok(date.with_time(time!(23:59:59.999)).assume_utc()),
        Err(_) => parse_instant(text),
    }
}
