//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{
    AppState, Error,
    auth::{auth_guard, get_me, post_log_in, register_user},
    config::Environment,
    dashboard::{get_monthly, get_recent, get_summary},
    endpoints,
    export::{export_csv, export_json},
    logging::logging_middleware,
    middleware::{add_security_headers, cors_layer, error_envelope, handle_panic},
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, get_transaction_endpoint, list_categories_endpoint,
        list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes and middleware.
///
/// Request tracing is left to the caller, see
/// [add_tracing_layer](crate::logging::add_tracing_layer).
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::ME, get(get_me));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::CATEGORIES, get(list_categories_endpoint))
        .route(endpoints::TRANSACTION, get(get_transaction_endpoint))
        .route(endpoints::DASHBOARD_SUMMARY, get(get_summary))
        .route(endpoints::DASHBOARD_MONTHLY, get(get_monthly))
        .route(endpoints::DASHBOARD_RECENT, get(get_recent))
        .route(endpoints::EXPORT_CSV, get(export_csv))
        .route(endpoints::EXPORT_JSON, get(export_json))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let router = protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            state.environment,
            error_envelope,
        ))
        .layer(cors_layer(state.environment, state.frontend_origin.clone()))
        .with_state(state);

    add_security_headers(router)
}

#[derive(Debug, Serialize)]
struct IndexResponse {
    message: &'static str,
    version: &'static str,
    status: &'static str,
}

/// Describe the API.
async fn get_index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Loopr Backend API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    environment: Environment,
}

/// Report that the server is up.
async fn get_health(State(environment): State<Environment>) -> Result<Json<HealthResponse>, Error> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|error| Error::Internal(format!("could not format timestamp: {error}")))?;

    Ok(Json(HealthResponse {
        status: "OK",
        timestamp,
        environment,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::datetime};

    use crate::{
        build_router,
        config::Environment,
        endpoints::{self, format_endpoint},
        test_utils::{get_header, test_state},
        transaction::NewTransaction,
    };

    fn server() -> TestServer {
        let state = test_state(vec![
            NewTransaction::new(-12.0, datetime!(2024-04-01 10:00 UTC))
                .unwrap()
                .category("Food")
                .description("Lunch"),
        ]);

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    async fn log_in(server: &TestServer) -> String {
        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": "test@example.com",
                "password": "averysafeandsecurepassword",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = server().get(endpoints::HEALTH).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "OK");
        assert_eq!(body["environment"], "development");
        assert!(OffsetDateTime::parse(body["timestamp"].as_str().unwrap(), &Rfc3339).is_ok());
        assert_eq!(get_header(&response, "x-content-type-options"), "nosniff");
    }

    #[tokio::test]
    async fn root_describes_api() {
        let response = server().get(endpoints::ROOT).await;

        response.assert_json(&json!({
            "message": "Loopr Backend API",
            "version": env!("CARGO_PKG_VERSION"),
            "status": "running",
        }));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = server().get("/api/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "error": "Route not found" }));
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let server = server();

        for endpoint in [
            endpoints::TRANSACTIONS,
            endpoints::CATEGORIES,
            endpoints::DASHBOARD_SUMMARY,
            endpoints::DASHBOARD_MONTHLY,
            endpoints::DASHBOARD_RECENT,
            endpoints::EXPORT_CSV,
            endpoints::EXPORT_JSON,
        ] {
            let response = server.get(endpoint).await;

            assert_eq!(
                response.status_code(),
                StatusCode::UNAUTHORIZED,
                "want 401 for {endpoint}"
            );
        }
    }

    #[tokio::test]
    async fn create_then_fetch_transaction() {
        let server = server();
        let token = log_in(&server).await;

        let created = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({
                "amount": 2500,
                "category": "Salary",
                "date": "2024-04-30T09:00:00Z",
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let id = created.json::<Value>()["_id"].as_str().unwrap().to_owned();

        let fetched = server
            .get(&format_endpoint(endpoints::TRANSACTION, &id))
            .authorization_bearer(&token)
            .await;
        fetched.assert_status_ok();
        assert_eq!(fetched.json::<Value>()["category"], "Salary");

        let listed = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await;
        assert_eq!(listed.json::<Value>()["pagination"]["total"], 2);

        let categories = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer(&token)
            .await;
        categories.assert_json(&json!(["Food", "Salary"]));
    }

    #[tokio::test]
    async fn cors_preflight_is_answered() {
        let response = server()
            .method(axum::http::Method::OPTIONS, endpoints::TRANSACTIONS)
            .add_header("origin", "http://localhost:5173")
            .add_header("access-control-request-method", "POST")
            .await;

        response.assert_status_ok();
        assert_eq!(
            get_header(&response, "access-control-allow-origin"),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn production_uses_environment() {
        let state = crate::AppState {
            environment: Environment::Production,
            ..test_state(vec![])
        };
        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        let response = server.get(endpoints::HEALTH).await;

        assert_eq!(response.json::<Value>()["environment"], "production");
    }
}
