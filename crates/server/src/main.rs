mod seed;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::AppState;
use workreq_core::{run_migrations, AppConfig, Database};

const DEFAULT_LOG_FILTER: &str =
    "info,workreq_server=debug,workreq_core=debug,auth=debug,requests=debug,api=debug,tower_http=debug";

#[derive(Parser, Debug)]
#[command(name = "workreq-server")]
#[command(about = "HTTP backend for procurement, repair and loan work requests")]
struct Args {
    /// Listen on this port instead of the configured one
    #[arg(long)]
    port: Option<u16>,

    /// Apply migrations and the seed account, then exit
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (mut config, overrides) = AppConfig::load_with_env().context("failed to load configuration")?;
    for key in &overrides {
        info!(%key, "Configuration value taken from environment");
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let db = Database::connect(&config.database)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.url))?;
    let applied = run_migrations(&db).await.context("failed to run migrations")?;
    info!(applied, "Database migrations up to date");

    let state = Arc::new(AppState::new(db.clone(), &config));

    if let Some(operator) = &config.seed.operator {
        seed::ensure_operator(&state.accounts, operator)
            .await
            .context("failed to seed operator account")?;
    }

    if args.migrate_only {
        db.close().await;
        return Ok(());
    }

    let app = api::router(state);
    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C; shutdown only by termination");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
