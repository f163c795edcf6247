//! Loopr is the backend for a personal finance web app.
//!
//! This library provides a JSON REST API for registering users, recording
//! transactions and summarizing them, backed by MongoDB. The
//! [ConnectionManager] owns the single database link for the whole process and
//! the server binary drains in-flight requests before closing it.

#![warn(missing_docs)]

pub mod app_state;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod endpoints;
mod error;
pub mod export;
pub mod extract;
pub mod import;
pub mod logging;
pub mod middleware;
mod not_found;
pub mod pagination;
mod routing;
mod shutdown;
pub mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{Environment, ServerArgs, ServerConfig};
pub use db::{ConnectionHooks, ConnectionManager, ConnectionState, log_connection_failure};
pub use error::{Error, GENERIC_ERROR_MESSAGE, InternalErrorDetail};
pub use logging::{add_tracing_layer, setup_logging};
pub use routing::build_router;
pub use shutdown::graceful_shutdown;
