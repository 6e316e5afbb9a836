mod answers;
mod bot;
mod browser;
mod config;
mod embeddings;
mod errors;
mod events;
mod form;
mod jobs;
mod llm_client;
mod profile;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::answers::AnswerResolver;
use crate::bot::{BotController, BotRunner, LiveBot, RunRequest, StopSignal};
use crate::config::{Config, EmbeddingBackend};
use crate::embeddings::{Embedder, HashingEmbedder, OpenAiEmbedder};
use crate::events::{spawn_display, EventSink, LogBuffer, QueueSink, TracingSink};
use crate::llm_client::LlmClient;
use crate::profile::resume::{fallback_summary, load_resume_text};
use crate::profile::ProfileStore;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "applier", version, about = "Fills Easy Apply job applications from a candidate profile")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP control panel.
    Serve,
    /// Run the bot once in the foreground, printing progress lines.
    Run {
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Resolve a single form question and print the answer.
    Ask {
        question: String,
        /// Use the profile-context path instead of the full resolver chain.
        #[arg(long)]
        generic: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Arc::new(Config::from_env()?);

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting applier v{}", env!("CARGO_PKG_VERSION"));

    let profile = Arc::new(
        ProfileStore::load(&config.profile_path)
            .with_context(|| format!("Failed to load profile {}", config.profile_path.display()))?
            .with_overrides(config.profile_overrides())?,
    );
    info!(fields = profile.len(), "Profile loaded");

    let resume_text = match profile.resume_path() {
        Some(path) => load_resume_text(&path, &profile),
        None => {
            warn!("No résumé path configured, using profile summary for prompts");
            fallback_summary(&profile)
        }
    };

    let embedder = build_embedder(&config)?;
    info!("Embedding backend: {}", embedder.name());

    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone())?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    match cli.command {
        Command::Ask { question, generic } => {
            let resolver =
                AnswerResolver::build(profile, embedder, llm, resume_text, Arc::new(TracingSink))
                    .await;
            if generic {
                println!("{}", resolver.answer_generic(&question).await);
            } else {
                let answer = resolver.resolve_detailed(&question).await;
                println!("{}", answer.text);
                println!("source: {:?}, confidence: {:.2}", answer.source, answer.confidence);
            }
        }

        Command::Run { keyword, location } => {
            let (queue, rx) = QueueSink::channel();
            let logs = LogBuffer::shared();
            let display = spawn_display(rx, logs, config.log_poll_interval, true);
            let sink: Arc<dyn EventSink> = Arc::new(queue);

            let resolver = Arc::new(
                AnswerResolver::build(profile, embedder, llm, resume_text, sink.clone()).await,
            );
            let bot = LiveBot::new(config.clone(), resolver, sink.clone());

            let stop = StopSignal::default();
            let ctrl_c_stop = stop.clone();
            let ctrl_c_sink = sink.clone();
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c_sink.emit("Interrupted, stopping after the current step");
                    ctrl_c_stop.request();
                }
            });

            let result = bot.run(RunRequest { keyword, location }, stop).await;
            watcher.abort();
            let _ = watcher.await;
            // Every sender must be gone before the display task can drain and exit.
            drop(bot);
            drop(sink);
            display.await.context("Display task panicked")?;

            let summary = result?;
            info!(?summary, "Run complete");
        }

        Command::Serve => {
            let (queue, rx) = QueueSink::channel();
            let logs = LogBuffer::shared();
            spawn_display(rx, logs.clone(), config.log_poll_interval, false);
            let sink: Arc<dyn EventSink> = Arc::new(queue);

            let resolver = Arc::new(
                AnswerResolver::build(profile, embedder, llm, resume_text, sink.clone()).await,
            );
            let runner = Arc::new(LiveBot::new(config.clone(), resolver, sink.clone()));
            let state = AppState {
                bot: BotController::new(runner, sink),
                logs,
                config: config.clone(),
            };

            // Build router
            let app = build_router(state)
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive());

            let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
            info!("Control panel listening on {addr}");

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.embedding_backend {
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::default()),
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbedder::new(
            config.embedding_api_key.clone().unwrap_or_default(),
            &config.embedding_base_url,
            config.embedding_model.clone(),
        )?),
    };
    Ok(embedder)
}
