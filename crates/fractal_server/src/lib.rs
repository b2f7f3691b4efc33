use anyhow::Context as _;
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;

mod auth;
pub mod engine;
pub mod generate;
mod server;

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8421";
pub const DEFAULT_WEB_DIST_DIR: &str = "web/out";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.cerebras.cloud/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-4-scout-17b-16e-instruct";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.to_owned(),
            model: DEFAULT_LLM_MODEL.to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub web_dist_dir: PathBuf,
    pub llm: LlmConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = trimmed_env("FRACTAL_SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_owned())
            .parse()
            .context("invalid FRACTAL_SERVER_ADDR")?;

        let db_path = fractal_backend::resolve_db_path()?;

        let web_dist_dir = trimmed_env("FRACTAL_WEB_DIST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WEB_DIST_DIR));

        let llm = LlmConfig {
            api_key: trimmed_env("FRACTAL_LLM_API_KEY").or_else(|| trimmed_env("CEREBRAS_API_KEY")),
            base_url: trimmed_env("FRACTAL_LLM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_owned()),
            model: trimmed_env("FRACTAL_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_owned()),
        };

        Ok(Self {
            addr,
            db_path,
            web_dist_dir,
            llm,
        })
    }
}

fn trimmed_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub struct StartedServer {
    pub addr: SocketAddr,
    handle: Option<tokio::task::JoinHandle<anyhow::Result<()>>>,
    sessions: auth::Sessions,
}

impl StartedServer {
    pub async fn wait(self) -> anyhow::Result<()> {
        let mut this = self;
        let handle = this.handle.take().context("server task already consumed")?;

        handle
            .await
            .context("server task panicked")?
            .context("server failed")?;
        Ok(())
    }
}

impl Drop for StartedServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        // Engines hold the store; once they stop, the sqlite worker exits too.
        self.sessions.shutdown_all();
    }
}

pub async fn start_server_with_config(config: ServerConfig) -> anyhow::Result<StartedServer> {
    let addr = config.addr;
    let (app, sessions): (Router, _) = server::router(config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let actual = listener.local_addr().context("failed to read local addr")?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.context("server failed")?;
        Ok(())
    });

    Ok(StartedServer {
        addr: actual,
        handle: Some(handle),
        sessions,
    })
}
