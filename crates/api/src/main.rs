use anyhow::Context;

use mergington_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    mergington_observability::init_with(config.log_format);

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }
    tracing::debug!(?config, "configuration loaded");

    mergington_api::server::run(config).await
}
