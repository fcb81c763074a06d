use mindhaven::{AppState, Config, router, storage::ensure_parent};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    ensure_parent(&config.mood_log_path).await?;
    ensure_parent(&config.community_path).await?;

    let state = AppState::new(&config);
    info!(
        moods = %config.mood_log_path.display(),
        community = %config.community_path.display(),
        model = %state.relay.model(),
        chat_enabled = config.openai_api_key.is_some(),
        "storage and chat configured"
    );

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            error!("failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await
        }
    }
}
