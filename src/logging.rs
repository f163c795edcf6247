//! Logging setup and middleware for logging requests and responses.

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, Request},
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::Error;

/// The fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

/// The text logged in place of a redacted value.
const REDACTED: &str = "********";

/// Bodies longer than this are truncated at the `debug` level and logged in
/// full at the `trace` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Install a pretty stdout subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Calling this more than once is a no-op.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .try_init();
}

/// Wrap `router` in a span per request.
pub fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}

/// Log the request and response for each request at the `debug` level.
///
/// Passwords in form and JSON bodies are redacted. Does nothing unless
/// `debug` logging is enabled, so bodies are not buffered in production.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return Error::Validation(format!("could not read request body: {error}"))
                .into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes);

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    log_request(&parts, &redact_body(content_type, &body_text));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return Error::Internal(format!("could not read response body: {error}"))
                .into_response();
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn redact_body(content_type: &str, body_text: &str) -> String {
    if content_type.starts_with("application/x-www-form-urlencoded") {
        REDACTED_FIELDS
            .iter()
            .fold(body_text.to_owned(), |text, field| redact_password(&text, field))
    } else if content_type.starts_with("application/json") {
        match serde_json::from_str::<Value>(body_text) {
            Ok(mut value) => {
                redact_json(&mut value);
                value.to_string()
            }
            Err(_) => body_text.to_owned(),
        }
    } else {
        body_text.to_owned()
    }
}

fn redact_password(form_text: &str, field_name: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if name == field_name => format!("{name}={REDACTED}"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_json(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_json),
        _ => {}
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return body;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::trace!("Full request body: {body:?}");
    } else {
        tracing::debug!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Sending response: {}\nbody: {}...", parts.status, truncate(body));
        tracing::trace!("Full response body: {body:?}");
    } else {
        tracing::debug!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}
