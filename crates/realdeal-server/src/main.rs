mod config;

use std::sync::Arc;

use tracing::{info, warn};

use realdeal_api::{AppState, AppStateInner, build_router};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "realdeal=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.admin_email == config::DEFAULT_ADMIN_EMAIL {
        warn!("REALDEAL_ADMIN_EMAIL not set, admin panel is bound to {}", config.admin_email);
    }

    // Init database
    let db = realdeal_db::Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        admin_email: config.admin_email.clone(),
        upload_dir: config.upload_dir.clone(),
        max_upload_bytes: config.max_upload_bytes,
    });

    if config.seed_demo {
        let summary = realdeal_api::demo::seed(&state).await?;
        info!("Demo data ready ({} new rows)", summary.inserted);
    }

    let app = build_router(state);

    let addr = config.addr()?;
    info!("RealDeal server listening on {}", addr);
    info!("Uploads stored in {}", config.upload_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
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
