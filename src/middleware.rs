//! Response hardening shared by every route: security headers, CORS, the
//! panic catcher and the environment-gated error envelope.

use std::any::Any;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::{
    Error,
    config::Environment,
    error::{GENERIC_ERROR_MESSAGE, InternalErrorDetail},
};

/// The headers added to every response that does not set them itself.
const SECURITY_HEADERS: [(&str, &str); 12] = [
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
         form-action 'self';frame-ancestors 'self';img-src 'self' data:;\
         object-src 'none';script-src 'self';script-src-attr 'none';\
         style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Add the standard set of security headers to every response from `router`.
pub fn add_security_headers(router: Router) -> Router {
    SECURITY_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            ))
        })
}

/// Build the CORS policy for `environment`.
///
/// Development mirrors whichever origin made the request. Production only
/// allows `frontend_origin`, and no origin at all if it is missing.
pub fn cors_layer(environment: Environment, frontend_origin: Option<HeaderValue>) -> CorsLayer {
    let allow_origin = match (environment, frontend_origin) {
        (Environment::Development, _) => AllowOrigin::mirror_request(),
        (Environment::Production, Some(origin)) => AllowOrigin::list([origin]),
        (Environment::Production, None) => AllowOrigin::list(Vec::<HeaderValue>::new()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Rewrite 500 responses so that only development builds show the error text.
///
/// Handlers attach an [InternalErrorDetail] to 500 responses through
/// [Error]'s `IntoResponse` implementation. In production the generic
/// message already in the body is kept.
pub async fn error_envelope(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(InternalErrorDetail(detail)) = response.extensions_mut().remove::<InternalErrorDetail>()
    else {
        return response;
    };

    let message = match environment {
        Environment::Development => detail,
        Environment::Production => GENERIC_ERROR_MESSAGE.to_owned(),
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "message": message,
        })),
    )
        .into_response()
}

/// Convert a panic in a handler into a 500 response.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic payload"
    };

    Error::Internal(format!("request handler panicked: {message}")).into_response()
}
