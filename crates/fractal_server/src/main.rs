use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = fractal_server::ServerConfig::from_env()?;
    if config.llm.api_key.is_none() {
        tracing::warn!("no LLM API key configured; generation requests will fail");
    }
    tracing::info!(db_path = %config.db_path.display(), "using project database");

    let server = fractal_server::start_server_with_config(config).await?;
    tracing::info!(addr = %server.addr, "fractal_server listening");
    server.wait().await?;
    Ok(())
}
