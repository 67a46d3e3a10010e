use anyhow::Context;

use ledgerbook_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ledgerbook_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting ledgerbook-api");

    let app = ledgerbook_api::app::build_app(&config)
        .await
        .context("failed to initialise storage")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
