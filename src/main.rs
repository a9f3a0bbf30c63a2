use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use nutrikids::bot::Bot;
use nutrikids::channels::{ChannelManager, CliChannel, TelegramChannel};
use nutrikids::config::BotConfig;
use nutrikids::intake::{IntakeEngine, StatusRouteState, status_routes};
use nutrikids::llm::create_provider;
use nutrikids::store::{LibSqlBackend, ProfileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = BotConfig::from_env().context("Invalid configuration")?;

    // Held for the whole run so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(config.log_dir.as_deref());

    eprintln!("🧸 NutriKids v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({:?})", config.llm.model, config.llm.backend);
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Trial limit: {}", config.trial_limit);

    let (store, engine) = build_engine(&config)
        .await
        .context("Failed to initialize NutriKids")?;

    // ── Status HTTP server ───────────────────────────────────────────────
    if let Some(http) = config.http {
        let app = status_routes(StatusRouteState {
            store: Arc::clone(&store),
        })
        .layer(tower_http::trace::TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind((http.bind, http.port))
            .await
            .with_context(|| format!("Failed to bind status server port {}", http.port))?;
        eprintln!("   Status API: http://{}:{}/health", http.bind, http.port);

        tokio::spawn(async move {
            tracing::info!(port = http.port, "Status server started");
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Status server stopped: {}", e);
            }
        });
    }

    // ── Channels ─────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();
    channels.add(Box::new(CliChannel::new()));

    if let Some(telegram) = config.telegram.clone() {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            telegram.allowed_users.join(", ")
        );
        channels.add(Box::new(TelegramChannel::new(telegram)));
    }

    eprintln!("   Type a message and press Enter. Ctrl+C to exit.\n");

    Bot::new(engine, channels).run().await?;

    Ok(())
}

/// Open the profile store and wire the intake engine to the LLM provider.
async fn build_engine(
    config: &BotConfig,
) -> nutrikids::error::Result<(Arc<dyn ProfileStore>, Arc<IntakeEngine>)> {
    let store: Arc<dyn ProfileStore> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
    let llm = create_provider(&config.llm)?;

    let engine = Arc::new(IntakeEngine::new(
        Arc::clone(&store),
        llm,
        config.offer.clone(),
        config.trial_limit,
    ));
    Ok((store, engine))
}

/// Stderr logging, plus a daily rolling file when `log_dir` is set.
fn init_tracing(log_dir: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "nutrikids.log"));
            let file_layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
