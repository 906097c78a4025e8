use agent_auth::{CachedKeyStore, RemoteKeyStore};
use agent_config::{Config, LogFormat};
use agent_provider::{GitHubProfile, OpenAiProvider};
use agent_proxy::AppState;
use agent_types::KeyStore;
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "copilot-agent", about = "copilot-agent: signed GitHub Copilot agent server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the agent server.
    Serve {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Override the listening port (default: 3000).
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the listening address (default: 0.0.0.0).
        #[arg(long)]
        host: Option<String>,
    },
    /// Fetch and list the platform's current signing keys.
    Keys {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port, host } => cmd_serve(config, port, host).await,
        Commands::Keys { config } => cmd_keys(config).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    Config::load(path.map(PathBuf::as_path)).context("config error")
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")
}

fn key_store(config: &Config, http: reqwest::Client) -> Arc<dyn KeyStore> {
    let remote = RemoteKeyStore::new(
        http,
        config.keys_url(),
        config.user_agent.clone(),
        config.timeouts.keys(),
    );
    match config.key_cache_ttl() {
        Some(ttl) => Arc::new(CachedKeyStore::new(remote, ttl)),
        None => Arc::new(remote),
    }
}

async fn cmd_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path.as_ref())?;
    if let Some(p) = port {
        config.port = p;
    }
    if let Some(h) = host {
        config.host = h;
    }
    init_tracing(&config);

    let http = http_client()?;
    let keys = key_store(&config, http.clone());
    let profile = Arc::new(GitHubProfile::new(
        http.clone(),
        config.profile_url(),
        config.user_agent.clone(),
        config.timeouts.profile(),
    ));
    let provider = Arc::new(OpenAiProvider::new(
        http,
        config.completions_url(),
        config.user_agent.clone(),
        config.timeouts.provider(),
    ));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        model = %config.llm_model,
        provider = %config.completions_url(),
        key_cache = ?config.key_cache_ttl(),
        "starting agent"
    );

    let state = AppState::new(Arc::new(config), keys, profile, provider);
    let app = agent_proxy::make_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "copilot-agent listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn cmd_keys(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_ref())?;
    init_tracing(&config);

    let store = RemoteKeyStore::new(
        http_client()?,
        config.keys_url(),
        config.user_agent.clone(),
        config.timeouts.keys(),
    );
    let keys = store
        .fetch_keys()
        .await
        .with_context(|| format!("failed to fetch keys from {}", store.url()))?;
    for key in &keys {
        let marker = if key.is_current { " (current)" } else { "" };
        println!("{}{marker}", key.identifier);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
