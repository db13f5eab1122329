//! Fetch the accounts visible to the configured customer app.
//!
//! Usage: `cargo run -p finverse-client --example accounts -- --config finverse.toml`
//! with the secret in FINVERSE_CLIENT_SECRET.

use anyhow::{Context, Result};
use finverse_client::{ClientConfig, FinverseClient};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = ClientConfig::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = ClientConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    info!(base_url = %config.base_url, "configuration loaded");

    let client = FinverseClient::new(&config).context("failed to build client")?;
    let accounts = client
        .get_accounts()
        .await
        .context("failed to fetch accounts")?;

    println!("{}", serde_json::to_string_pretty(&accounts)?);
    info!(metrics = %prometheus.render(), "done");
    Ok(())
}
