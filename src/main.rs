use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use visitlog::config::Config;
use visitlog::{AppState, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("visitlog=info,tower_http=info")),
        )
        .init();

    let config = Config::load()?;
    config.log_summary();
    let addr = config.bind_address;

    let state = AppState::from_config(config).await?;
    tracing::info!("Storage backend: {}", state.service.store().backend_name());
    let app = build_app(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    visitlog::serve(listener, app).await?;

    Ok(())
}
