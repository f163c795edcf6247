//! Request body extraction shared by the JSON API handlers.

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;

use crate::Error;

/// Deserializes a request body as a URL-encoded form or as JSON, depending on
/// the `Content-Type` header.
///
/// Bodies without a form content type are read as JSON, so a missing or
/// unexpected content type produces a validation error instead of a 415.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(request, state).await?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(request, state).await?;
            Ok(Self(value))
        }
    }
}
