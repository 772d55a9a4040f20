use anyhow::{anyhow, Result};
use parley::config::AppConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Parley");

    let config = AppConfig::load_or_default();
    info!("Chat endpoint: {}", config.endpoint);

    parley::ui::run(config).map_err(|e| anyhow!("UI error: {}", e))?;

    Ok(())
}
