//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::error::{ErrorKind, WriteFailure};
use serde_json::json;

/// MongoDB server error code for a violated unique index.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required setting is missing or malformed.
    ///
    /// Fatal at startup, the process exits before accepting requests.
    #[error("{0}")]
    Configuration(String),

    /// The database could not be reached or the handshake timed out.
    ///
    /// Fatal at startup. After startup the driver reconnects on its own and
    /// these errors only surface on the request that hit them.
    #[error("could not reach the database: {0}")]
    Connectivity(String),

    /// A client supplied a malformed document or request body.
    #[error("{0}")]
    Validation(String),

    /// A date string or number could not be interpreted as a calendar instant.
    #[error("could not parse \"{0}\" as a date")]
    InvalidDate(String),

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The email and password do not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The bearer token is missing, malformed or expired.
    #[error("missing or invalid authentication token")]
    InvalidToken,

    /// Another user has already registered with the email address.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled error reported by the database driver.
    #[error("an unexpected database error occurred: {0}")]
    Database(String),

    /// A file could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// Anything else that should never reach the client in detail.
    #[error("{0}")]
    Internal(String),
}

impl From<mongodb::error::Error> for Error {
    fn from(error: mongodb::error::Error) -> Self {
        match error.kind.as_ref() {
            ErrorKind::InvalidArgument { .. } => Error::Configuration(error.to_string()),
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Authentication { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => Error::Connectivity(error.to_string()),
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE =>
            {
                Error::DuplicateEmail
            }
            _ => {
                tracing::error!("an unhandled database error occurred: {error}");
                Error::Database(error.to_string())
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for Error {
    fn from(rejection: FormRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

/// The text of an error that produced a 500 response.
///
/// Attached to the response extensions so that the error envelope middleware
/// can decide how much of it to show the client.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalErrorDetail(pub String);

/// The message shown to clients in place of internal error details.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidDate(_) | Error::TooWeak(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Configuration(_)
            | Error::Connectivity(_)
            | Error::HashingError(_)
            | Error::Database(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status != StatusCode::INTERNAL_SERVER_ERROR {
            return (status, Json(json!({ "error": self.to_string() }))).into_response();
        }

        // Any errors that are not handled above are not intended to be shown to the client.
        tracing::error!("An unexpected error occurred: {}", self);
        let mut response = (
            status,
            Json(json!({
                "error": "Internal server error",
                "message": GENERIC_ERROR_MESSAGE,
            })),
        )
            .into_response();
        response
            .extensions_mut()
            .insert(InternalErrorDetail(self.to_string()));

        response
    }
}
