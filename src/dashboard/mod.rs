//! Dashboard module
//!
//! Provides financial summaries over the stored transactions: overall and
//! per-category totals, month by month totals and the latest transactions.

mod aggregation;
mod handlers;

pub use aggregation::{
    CategoryTotal, MonthlyTotal, Summary, UNCATEGORIZED_LABEL, monthly_totals, summarize,
};
pub use handlers::{MonthlyParams, RecentParams, get_monthly, get_recent, get_summary};
