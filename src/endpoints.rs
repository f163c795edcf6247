//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

/// The root route describing the API.
pub const ROOT: &str = "/";
/// The liveness probe.
pub const HEALTH: &str = "/health";

/// The route for creating an account.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for getting the logged in user.
pub const ME: &str = "/api/auth/me";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to list the categories in use.
pub const CATEGORIES: &str = "/api/transactions/categories";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// The route for income, expense and category totals.
pub const DASHBOARD_SUMMARY: &str = "/api/dashboard/summary";
/// The route for totals per month.
pub const DASHBOARD_MONTHLY: &str = "/api/dashboard/monthly";
/// The route for the latest transactions.
pub const DASHBOARD_RECENT: &str = "/api/dashboard/recent";

/// The route to download transactions as CSV.
pub const EXPORT_CSV: &str = "/api/export/csv";
/// The route to download transactions as JSON.
pub const EXPORT_JSON: &str = "/api/export/json";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/transactions/{transaction_id}',
/// '{transaction_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
