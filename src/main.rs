use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paygate::config::Config;
use paygate::db::{create_pool, init_db, queries, AppState};
use paygate::gateway::RazorpayClient;
use paygate::handlers;

#[derive(Parser, Debug)]
#[command(name = "paygate")]
#[command(about = "Razorpay-backed order and entitlement service")]
struct Cli {
    /// Seed the database with dev coupons
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the coupon table with dev data for testing checkout discounts.
/// Only runs in dev mode.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    queries::upsert_coupon(&conn, "WELCOME10", 10, true).expect("Failed to seed coupon");
    queries::upsert_coupon(&conn, "FESTIVE25", 25, true).expect("Failed to seed coupon");
    queries::upsert_coupon(&conn, "EXPIRED50", 50, false).expect("Failed to seed coupon");

    tracing::info!("============================================");
    tracing::info!("DEV COUPONS SEEDED");
    tracing::info!("  WELCOME10  -> 10% (valid)");
    tracing::info!("  FESTIVE25  -> 25% (valid)");
    tracing::info!("  EXPIRED50  -> 50% (invalid, for testing)");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paygate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create database connection pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let gateway = Arc::new(RazorpayClient::new(&config.key_id, &config.key_secret));

    let state = AppState {
        db: db_pool,
        config: config.clone(),
        gateway,
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set PAYGATE_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Paygate server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        // Also remove WAL and SHM files if they exist
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
