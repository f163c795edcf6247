//! Command line and environment configuration for the server.

use std::{convert::Infallible, fmt::Display, str::FromStr, time::Duration};

use axum::http::{HeaderValue, Uri};
use clap::Parser;
use serde::Serialize;

use crate::{Error, db::require_uri};

/// The deployment environment, read from `NODE_ENV`.
///
/// Gates the CORS policy and how much detail internal errors show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Permissive CORS and full error messages.
    #[default]
    Development,
    /// CORS restricted to the frontend origin and generic error messages.
    Production,
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("production") {
            Ok(Environment::Production)
        } else {
            Ok(Environment::Development)
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// The REST API server for the personal finance app.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct ServerArgs {
    /// Connection string for the MongoDB deployment.
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,

    /// The port to serve the API from. The server binds to all interfaces.
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// The deployment environment, `development` or `production`.
    #[arg(long, env = "NODE_ENV", default_value = "development")]
    pub environment: Environment,

    /// The secret used to sign authentication tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// The origin allowed to make cross-origin requests in production.
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// How long to wait for in-flight requests after a shutdown signal.
    #[arg(long, default_value_t = 10)]
    pub shutdown_grace_secs: u64,
}

/// Validated server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Connection string for the MongoDB deployment.
    pub mongodb_uri: String,
    /// The port to listen on.
    pub port: u16,
    /// The deployment environment.
    pub environment: Environment,
    /// The secret used to sign authentication tokens.
    pub jwt_secret: String,
    /// The only origin allowed by CORS in production.
    pub frontend_origin: Option<HeaderValue>,
    /// How long to drain in-flight requests on shutdown.
    pub shutdown_grace_period: Duration,
}

impl ServerArgs {
    /// Check the raw arguments and convert them into a [ServerConfig].
    ///
    /// # Errors
    /// Returns [Error::Configuration] if `MONGODB_URI` or `JWT_SECRET` is
    /// missing or empty, if `FRONTEND_URL` is missing in production, or if
    /// `FRONTEND_URL` is set but is not a single http(s) origin.
    pub fn into_config(self) -> Result<ServerConfig, Error> {
        let mongodb_uri = require_uri(self.mongodb_uri.as_deref())?.to_owned();

        let jwt_secret = self
            .jwt_secret
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration("JWT_SECRET environment variable is not defined".to_owned())
            })?;

        let frontend_origin = match (self.environment, self.frontend_url.as_deref()) {
            (_, Some(url)) if !url.trim().is_empty() => Some(parse_origin(url)?),
            (Environment::Production, _) => {
                return Err(Error::Configuration(
                    "FRONTEND_URL must be set in production".to_owned(),
                ));
            }
            (Environment::Development, _) => None,
        };

        Ok(ServerConfig {
            mongodb_uri,
            port: self.port,
            environment: self.environment,
            jwt_secret,
            frontend_origin,
            shutdown_grace_period: Duration::from_secs(self.shutdown_grace_secs),
        })
    }
}

/// Parse `FRONTEND_URL` as a single `scheme://host[:port]` origin.
///
/// A trailing slash is dropped to match the `Origin` header.
fn parse_origin(url: &str) -> Result<HeaderValue, Error> {
    let invalid = |reason: &str| {
        Error::Configuration(format!(
            "FRONTEND_URL \"{url}\" is not a valid origin: {reason}"
        ))
    };

    let trimmed = url.trim().trim_end_matches('/');
    let uri: Uri = trimmed.parse().map_err(|_| invalid("could not parse it"))?;

    match uri.scheme_str() {
        Some("http" | "https") => {}
        _ => return Err(invalid("the scheme must be http or https")),
    }
    if uri.authority().is_none_or(|authority| authority.host().is_empty()) {
        return Err(invalid("it has no host"));
    }
    if uri.path_and_query().is_some_and(|path| !matches!(path.as_str(), "" | "/")) {
        return Err(invalid("it must not have a path or query"));
    }

    HeaderValue::from_str(trimmed).map_err(|error| invalid(&error.to_string()))
}
