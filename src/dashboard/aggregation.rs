//! Transaction data aggregation for the dashboard.
//!
//! Provides functions to total income and expenses, group totals by category
//! and bucket transactions by calendar month.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::transaction::Transaction;

/// The label used for transactions without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// The total and number of transactions in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category label.
    pub category: String,
    /// The sum of the signed amounts.
    pub total: f64,
    /// The number of transactions.
    pub count: u64,
}

/// Income, expenses and per-category totals over a set of transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of positive amounts.
    pub total_income: f64,
    /// The sum of the absolute value of negative amounts.
    pub total_expenses: f64,
    /// Income minus expenses.
    pub net: f64,
    /// The number of transactions summarized.
    pub transaction_count: u64,
    /// Category totals, largest absolute total first.
    pub categories: Vec<CategoryTotal>,
}

/// Income and expenses within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// The month formatted as `YYYY-MM`.
    pub month: String,
    /// The sum of positive amounts.
    pub income: f64,
    /// The sum of the absolute value of negative amounts.
    pub expenses: f64,
    /// Income minus expenses.
    pub net: f64,
}

/// Summarize `transactions` into income, expense and category totals.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    let mut by_category: HashMap<&str, (f64, u64)> = HashMap::new();

    for transaction in transactions {
        if transaction.amount > 0.0 {
            total_income += transaction.amount;
        } else {
            total_expenses += -transaction.amount;
        }

        let label = if transaction.category.is_empty() {
            UNCATEGORIZED_LABEL
        } else {
            transaction.category.as_str()
        };
        let entry = by_category.entry(label).or_insert((0.0, 0));
        entry.0 += transaction.amount;
        entry.1 += 1;
    }

    let mut categories: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_owned(),
            total,
            count,
        })
        .collect();
    categories.sort_by(|a, b| {
        b.total
            .abs()
            .total_cmp(&a.total.abs())
            .then_with(|| a.category.cmp(&b.category))
    });

    Summary {
        total_income,
        total_expenses,
        net: total_income - total_expenses,
        transaction_count: transactions.len() as u64,
        categories,
    }
}

/// Bucket `transactions` by UTC calendar month.
///
/// # Returns
/// The last `months` months that contain at least one transaction, in
/// chronological order.
pub fn monthly_totals(transactions: &[Transaction], months: usize) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<(i32, u8), (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let date = transaction.date.to_offset(time::UtcOffset::UTC).date();
        let entry = totals
            .entry((date.year(), u8::from(date.month())))
            .or_insert((0.0, 0.0));

        if transaction.amount > 0.0 {
            entry.0 += transaction.amount;
        } else {
            entry.1 += -transaction.amount;
        }
    }

    let skip = totals.len().saturating_sub(months);

    totals
        .into_iter()
        .skip(skip)
        .map(|((year, month), (income, expenses))| MonthlyTotal {
            month: format!("{year:04}-{month:02}"),
            income,
            expenses,
            net: income - expenses,
        })
        .collect()
}
