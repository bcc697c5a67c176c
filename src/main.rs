use tracing_subscriber::EnvFilter;

use crm_gateway::server::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends.
    let _ = dotenvy::dotenv();

    let config = crm_gateway::config::config().clone();

    let default_filter = if config.api.enable_request_logging {
        "info,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("Starting CRM gateway in {:?} mode", config.environment);
    if config.database.url.is_none() {
        tracing::warn!("DATABASE_URL is not set; only ?ping will succeed");
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(config)?;
    let db = state.db.clone();

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("CRM gateway listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    db.close().await;
    Ok(())
}
