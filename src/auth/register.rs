//! The endpoint for creating an account.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    app_state::AuthState,
    auth::{AuthResponse, NewUser, PasswordHash, ValidatedPassword, encode_token},
    extract::JsonOrForm,
};

/// The details a client sends to create an account.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The email to log in with. Stored in lowercase.
    pub email: String,
    /// The password to log in with.
    pub password: String,
    /// The name shown in the app.
    #[serde(default)]
    pub name: String,
}

/// Normalize an email address and check its syntax.
pub(crate) fn normalize_email(email: &str) -> Result<String, Error> {
    let email = email.trim().to_lowercase();

    if EmailAddress::is_valid(&email) {
        Ok(email)
    } else {
        Err(Error::Validation(format!("\"{email}\" is not a valid email address")))
    }
}

/// Create a user and respond with a token for them.
///
/// # Errors
/// - 400 if the email is invalid or the password is too weak.
/// - 409 if the email is already registered.
pub async fn register_user(
    State(state): State<AuthState>,
    JsonOrForm(form): JsonOrForm<RegisterForm>,
) -> Result<Response, Error> {
    let email = normalize_email(&form.email)?;
    let name = form.name.trim().to_owned();
    let password = ValidatedPassword::new(&form.password, &[email.as_str(), name.as_str()])?;
    let password_hash = PasswordHash::new(password, state.password_cost)?;

    let user = state
        .users
        .create(NewUser {
            email,
            name,
            password_hash,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;

    tracing::info!("registered user {}", user.id);

    let token = encode_token(&user.id, &user.email, OffsetDateTime::now_utc(), &state.jwt_keys)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    )
        .into_response())
}
