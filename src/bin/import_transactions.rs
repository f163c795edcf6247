use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

use loopr_backend::{
    ConnectionHooks, ConnectionManager, Error,
    import::{DEFAULT_IMPORT_FILE, ImportMode, read_import_file, run_import},
    log_connection_failure, setup_logging,
    transaction::MongoTransactionStore,
};

/// Load transactions from a JSON file into the database.
///
/// By default every stored transaction is deleted first.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Connection string for the MongoDB deployment.
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    mongodb_uri: Option<String>,

    /// Path to a JSON array of transactions.
    #[arg(short, long, default_value = DEFAULT_IMPORT_FILE)]
    file: PathBuf,

    /// Keep the stored transactions instead of replacing them.
    #[arg(long)]
    append: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    let transactions = match read_import_file(&args.file).await {
        Ok(transactions) => transactions,
        Err(error) => {
            tracing::error!("Error importing transactions: {error}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        "Read {} transactions from {}",
        transactions.len(),
        args.file.display()
    );

    let manager =
        match ConnectionManager::connect(args.mongodb_uri.as_deref(), ConnectionHooks::default())
            .await
        {
            Ok(manager) => manager,
            Err(error) => {
                log_connection_failure(&error);
                return ExitCode::FAILURE;
            }
        };

    let mode = if args.append {
        ImportMode::Append
    } else {
        ImportMode::Replace
    };
    let store = MongoTransactionStore::new(manager.database());
    let result: Result<_, Error> = run_import(&store, transactions, mode).await;

    manager.shutdown().await;

    match result {
        Ok(report) => {
            tracing::info!(
                "Import finished: {} deleted, {} inserted",
                report.deleted,
                report.inserted
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!("Error importing transactions: {error}");
            ExitCode::FAILURE
        }
    }
}
