//! The endpoints for logging in and fetching the logged in user.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    app_state::AuthState,
    auth::{Claims, UserProfile, encode_token},
    extract::JsonOrForm,
};

/// The credentials a client sends to log in.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// The body returned after registering or logging in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// A bearer token for the `Authorization` header.
    pub token: String,
    /// The user the token was issued to.
    pub user: UserProfile,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email does not belong to a
/// registered user or the password is not correct.
pub async fn post_log_in(
    State(state): State<AuthState>,
    JsonOrForm(form): JsonOrForm<LogInForm>,
) -> Result<Json<AuthResponse>, Error> {
    let email = form.email.trim().to_lowercase();

    let user = match state.users.get_by_email(&email).await {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    if !user.password_hash.verify(&form.password)? {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(&user.id, &user.email, OffsetDateTime::now_utc(), &state.jwt_keys)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// The response body of [get_me].
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The logged in user.
    pub user: UserProfile,
}

/// Get the profile of the user the bearer token was issued to.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is invalid or its user no longer exists.
pub async fn get_me(
    State(state): State<AuthState>,
    claims: Claims,
) -> Result<Json<MeResponse>, Error> {
    let user = state.users.get(&claims.sub).await.map_err(|error| match error {
        Error::NotFound => Error::InvalidToken,
        error => error,
    })?;

    Ok(Json(MeResponse { user: user.into() }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        app_state::AuthState,
        auth::{JwtKeys, get_me, post_log_in, register_user},
        test_utils::InMemoryUserStore,
    };

    fn server() -> TestServer {
        let state = AuthState {
            users: Arc::new(InMemoryUserStore::default()),
            jwt_keys: JwtKeys::new("foobar"),
            password_cost: 4,
        };
        let app = Router::new()
            .route("/register", post(register_user))
            .route("/login", post(post_log_in))
            .route("/me", get(get_me))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    async fn register(server: &TestServer) {
        server
            .post("/register")
            .json(&json!({
                "email": "test@example.com",
                "password": "averysafeandsecurepassword",
                "name": "Tester",
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn register_log_in_and_fetch_profile() {
        let server = server();
        register(&server).await;

        let response = server
            .post("/login")
            .json(&json!({
                "email": " Test@Example.com",
                "password": "averysafeandsecurepassword",
            }))
            .await;
        response.assert_status_ok();
        let token = response.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_owned();

        let response = server.get("/me").authorization_bearer(token).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["user"]["name"], "Tester");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let server = server();
        register(&server).await;

        let response = server
            .post("/login")
            .json(&json!({ "email": "test@example.com", "password": "wrongpassword" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "invalid email or password" }));
    }

    #[tokio::test]
    async fn unknown_email_is_unauthorized() {
        let response = server()
            .post("/login")
            .json(&json!({ "email": "nobody@example.com", "password": "whatever" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_token() {
        server()
            .get("/me")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
