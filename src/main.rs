//! docqa-server binary: load config and index, serve the chat API.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docqa::{
    api::build_router,
    config::ConfigManager,
    index::VectorIndex,
    llm::{LLMClientFactory, LLMClientFactoryTrait},
    session::{FeedbackStore, SessionStore},
    AppState,
};

#[derive(Debug, Parser)]
#[command(name = "docqa-server", version, about = "Citation-aware RAG chat server")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "docqa.toml", env = "DOCQA_CONFIG")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_manager =
        Arc::new(ConfigManager::new(&cli.config).context("Failed to load configuration")?);
    let config = config_manager.config();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config_manager
        .start_watching()
        .context("Failed to start configuration watcher")?;

    let index = Arc::new(
        VectorIndex::load(&config.index.dir).with_context(|| {
            format!("Failed to load index from {}", config.index.dir.display())
        })?,
    );
    let stats = index.stats();
    tracing::info!(
        nodes = stats.node_count,
        dimensions = stats.dimensions,
        dir = %config.index.dir.display(),
        "Index loaded"
    );

    let llm_factory: Arc<dyn LLMClientFactoryTrait> = Arc::new(
        LLMClientFactory::from_config(&config).context("Failed to configure LLM provider")?,
    );
    tracing::info!(
        provider = llm_factory.provider().name(),
        model = llm_factory.provider().model(),
        "LLM provider configured"
    );

    let sessions = Arc::new(SessionStore::new(config.greeting()));
    let feedback = Arc::new(
        FeedbackStore::open(&config.feedback.path).context("Failed to open feedback store")?,
    );

    let state = AppState {
        config_manager: Arc::clone(&config_manager),
        index,
        llm_factory,
        sessions,
        feedback,
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "docqa-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
