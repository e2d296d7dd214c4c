/// API сервер для анализа продаж

use tracing_subscriber::EnvFilter;

use sales_ml::api::{router, AppState};
use sales_ml::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;
    let app = router(AppState::default());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("Server listening on http://{}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
