use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bloqqer_api::config::AppConfig;
use bloqqer_api::database::{DatabaseManager, MemoryStorage, PgStorage, Storage};
use bloqqer_api::server::{app, AppState};

#[derive(Parser)]
#[command(name = "bloqqer-api")]
#[command(about = "Bloqqer API - users, JWT login and soft-deleted articles")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides BLOQQER_API_PORT / PORT)")]
    port: Option<u16>,

    #[arg(
        long,
        conflicts_with = "migrate_only",
        help = "Keep everything in process memory instead of PostgreSQL"
    )]
    in_memory: bool,

    #[arg(long, help = "Apply database migrations and exit")]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let mut config: AppConfig = bloqqer_api::config::config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    tracing::info!("Starting Bloqqer API in {:?} mode", config.environment);

    let storage: Arc<dyn Storage> = if args.in_memory {
        tracing::warn!("Using in-memory storage; data is lost on exit");
        Arc::new(MemoryStorage::new())
    } else {
        let pool = DatabaseManager::connect(&config.database).await?;
        if config.database.run_migrations || args.migrate_only {
            DatabaseManager::migrate(&pool).await?;
        }
        if args.migrate_only {
            return Ok(());
        }
        Arc::new(PgStorage::new(pool))
    };

    let port = config.api.port;
    let state = AppState::new(config, storage).context("JWT_SECRET must be set")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Bloqqer API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
