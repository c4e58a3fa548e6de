use std::time::Duration;

use tracing_subscriber::EnvFilter;

use whodis_session::config::{config, Environment};
use whodis_session::server::{app, spawn_sweeper, with_request_logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SECURITY_SESSION_SECRET, SESSION_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    tracing::info!("Starting Who Dis? session service in {:?} mode", config.environment);

    if config.security.session_secret.is_empty() {
        anyhow::bail!("SECURITY_SESSION_SECRET must be set outside development");
    }
    if matches!(config.environment, Environment::Production) && !config.security.secure_cookies {
        tracing::warn!("Session cookies are not marked Secure in production");
    }

    let state = AppState::from_config(config);
    let sweeper = spawn_sweeper(
        state.store.clone(),
        Duration::from_secs(config.server.sweep_interval_secs.max(1)),
    );
    let router = with_request_logging(app(state), &config.server);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Session service listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    sweeper.abort();
    Ok(())
}
