mod config;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use microblog_api::state::{AppState, Settings};
use microblog_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "microblog=debug,microblog_api=debug,microblog_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.addr()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let state = AppState::new(
        db.clone(),
        Settings {
            names_file: config.names_file.clone(),
            seed_users: config.seed_users,
        },
    );

    let app = microblog_api::router(state).layer(TraceLayer::new_for_http());

    info!("Microblog listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router and its state are gone once serve returns, so this is the
    // last handle unless a blocking task is still running.
    match Arc::try_unwrap(db) {
        Ok(db) => db.close()?,
        Err(_) => warn!("Database still in use at shutdown; it will close when released"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
