//! Plagiscope: LLM-assisted plagiarism checks against your own reference texts.
//! Entry point for the `plagiscope` binary.

mod check;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use plagiscope_llm::{AnalysisClient, AnalysisSettings, GeminiBackend};
use plagiscope_web::{AppState, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "plagiscope", version, about = "Check a document for plagiarism against reference texts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web app (default)
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run a single check from the command line and print the report
    Check(check::CheckArgs),
}

fn build_analyzer(config: &config::Config) -> anyhow::Result<AnalysisClient> {
    let api_key = config.llm.api_key();
    if api_key.is_none() {
        tracing::warn!(
            "No Gemini API key configured (set llm.api_key or {}). Analyses will fail until one is provided.",
            config::API_KEY_ENV_VARS.join(" / ")
        );
    }

    let backend = GeminiBackend::new(api_key, config.llm.model.clone())
        .with_base_url(config.llm.base_url.clone())
        .with_timeout(Duration::from_secs(config.llm.request_timeout_secs))
        .context("Failed to build the Gemini HTTP client")?;

    let settings = AnalysisSettings {
        temperature: config.llm.temperature,
        max_output_tokens: config.llm.max_output_tokens,
    };
    Ok(AnalysisClient::new(Arc::new(backend), settings))
}

async fn serve(config: &config::Config, bind: Option<String>) -> anyhow::Result<()> {
    let analyzer = build_analyzer(config)?;
    info!("LLM backend ready: model {}", analyzer.model_id());

    let session = Session::new(
        config.analysis.default_document_type.clone(),
        config.analysis.web_search_default,
    );
    let router = plagiscope_web::router::build_router(AppState::new(analyzer, session));

    let bind_addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("Web app listening on http://{}", bind_addr);
    info!("   Session API: http://{}/api/session", bind_addr);
    info!("   Events:      http://{}/api/events", bind_addr);
    info!("Plagiscope ready. Press Ctrl+C to stop.");

    axum::serve(listener, router).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so `check --json` output stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("plagiscope=debug,info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Plagiscope {} starting up", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load()?;
    info!(
        "Configuration loaded. Model: {}, default document type: {}",
        config.llm.model, config.analysis.default_document_type
    );

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(&config, bind).await,
        Command::Check(args) => {
            let analyzer = build_analyzer(&config)?;
            check::run(analyzer, &config.analysis, args).await
        }
    }
}
