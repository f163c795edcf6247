use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use axum_server::Handle;
use clap::Parser;

use loopr_backend::{
    AppState, ConnectionHooks, ConnectionManager, ServerArgs, add_tracing_layer, auth::MongoUserStore,
    build_router, graceful_shutdown, log_connection_failure, setup_logging,
    transaction::MongoTransactionStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let config = match ServerArgs::parse().into_config() {
        Ok(config) => config,
        Err(error) => {
            log_connection_failure(&error);
            return ExitCode::FAILURE;
        }
    };

    let manager =
        match ConnectionManager::connect(Some(&config.mongodb_uri), ConnectionHooks::default())
            .await
        {
            Ok(manager) => manager,
            Err(error) => {
                log_connection_failure(&error);
                return ExitCode::FAILURE;
            }
        };

    let transactions = MongoTransactionStore::new(manager.database());
    let users = MongoUserStore::new(manager.database());

    if let Err(error) = transactions.ensure_indexes().await {
        tracing::warn!("Could not create transaction indexes: {error}");
    }
    if let Err(error) = users.ensure_indexes().await {
        tracing::warn!("Could not create user indexes: {error}");
    }

    let state = AppState::new(
        config.environment,
        config.frontend_origin.clone(),
        Arc::new(transactions),
        Arc::new(users),
        &config.jwt_secret,
    );

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(
        handle.clone(),
        config.shutdown_grace_period,
    ));

    let router = add_tracing_layer(build_router(state));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server running on port {}", config.port);
    tracing::info!("Environment: {}", config.environment);

    let served = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await;

    manager.shutdown().await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("Server error: {error}");
            ExitCode::FAILURE
        }
    }
}
