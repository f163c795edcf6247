//! JSON Web Tokens that authenticate API requests.

use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserId};

/// How long a token is valid for after it is issued.
pub const TOKEN_LIFETIME: Duration = Duration::hours(24);

/// The keys used to sign and verify tokens, derived from `JWT_SECRET`.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create HS256 keys from a shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: UserId,
    /// The email of the user at the time the token was issued.
    pub email: String,
    /// When the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: i64,
}

/// Issue a token for a user that is valid for [TOKEN_LIFETIME] from `now`.
///
/// # Errors
/// Returns [Error::Internal] if the token could not be signed.
pub fn encode_token(
    user_id: &UserId,
    email: &str,
    now: OffsetDateTime,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let claims = Claims {
        sub: user_id.clone(),
        email: email.to_owned(),
        iat: now.unix_timestamp(),
        exp: (now + TOKEN_LIFETIME).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|error| Error::Internal(format!("could not create token: {error}")))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, forged or expired.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map(|data| data.claims)
        .map_err(|error| {
            tracing::debug!("rejected token: {error}");
            Error::InvalidToken
        })
}

impl<S> FromRequestParts<S> for Claims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::InvalidToken)?;

        decode_token(bearer.token(), &JwtKeys::from_ref(state))
    }
}

/// Middleware that rejects requests without a valid bearer token.
///
/// The verified [Claims] are added to the request extensions.
pub async fn auth_guard(claims: Claims, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(claims);

    next.run(request).await
}
