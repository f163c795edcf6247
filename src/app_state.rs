//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use axum::{extract::FromRef, http::HeaderValue};

use crate::{
    auth::{JwtKeys, PasswordHash, UserStore},
    config::Environment,
    pagination::PaginationConfig,
    transaction::TransactionStore,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The deployment environment.
    pub environment: Environment,

    /// The only origin allowed by CORS in production.
    pub frontend_origin: Option<HeaderValue>,

    /// Where transactions are stored.
    pub transactions: Arc<dyn TransactionStore>,

    /// Where users are stored.
    pub users: Arc<dyn UserStore>,

    /// The keys for signing and verifying authentication tokens.
    pub jwt_keys: JwtKeys,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,

    /// The config that controls how to page through transactions.
    pub pagination_config: PaginationConfig,
}

impl AppState {
    /// Create a new [AppState] with the default password cost and pagination.
    pub fn new(
        environment: Environment,
        frontend_origin: Option<HeaderValue>,
        transactions: Arc<dyn TransactionStore>,
        users: Arc<dyn UserStore>,
        jwt_secret: &str,
    ) -> Self {
        Self {
            environment,
            frontend_origin,
            transactions,
            users,
            jwt_keys: JwtKeys::new(jwt_secret),
            password_cost: PasswordHash::DEFAULT_COST,
            pagination_config: PaginationConfig::default(),
        }
    }
}

/// The state needed for registering and authenticating users.
#[derive(Clone)]
pub struct AuthState {
    /// Where users are stored.
    pub users: Arc<dyn UserStore>,
    /// The keys for signing and verifying authentication tokens.
    pub jwt_keys: JwtKeys,
    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            jwt_keys: state.jwt_keys.clone(),
            password_cost: state.password_cost,
        }
    }
}

impl FromRef<AuthState> for JwtKeys {
    fn from_ref(state: &AuthState) -> Self {
        state.jwt_keys.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_keys.clone()
    }
}

impl FromRef<AppState> for Arc<dyn TransactionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.transactions.clone()
    }
}

impl FromRef<AppState> for PaginationConfig {
    fn from_ref(state: &AppState) -> Self {
        state.pagination_config.clone()
    }
}

impl FromRef<AppState> for Environment {
    fn from_ref(state: &AppState) -> Self {
        state.environment
    }
}
