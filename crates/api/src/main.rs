use anyhow::Context;

use menuhub_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    menuhub_observability::init(config.log_format);

    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }
    if config.token_ttl.is_none() {
        tracing::warn!("TOKEN_TTL_SECS not set; issued tokens never expire");
    }

    let app = menuhub_api::app::build_app(&config)
        .await
        .context("failed to build application")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
