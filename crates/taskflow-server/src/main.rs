use anyhow::Context;
use taskflow_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;
    if config.is_production() {
        config
            .validate_for_production()
            .context("configuration is not fit for production")?;
    } else if config.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set; signing tokens with the development secret");
    }

    let state = AppState::from_config(&config).context("failed to initialize authentication")?;
    let providers = state.auth.enabled_providers();
    let app = build_router(&config, state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        %addr,
        environment = ?config.environment,
        providers = ?providers,
        sessions = config.sessions_enabled,
        "Taskflow server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
