//! Grounder server
//!
//! Main entry point for the grounded question-answering service. Wires
//! configuration, logging, and the three external providers (search,
//! embedding, generation) around the HTTP surface.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use grounder::routes;
use grounder::state::AppState;
use grounder_core::{config::AppConfig, logging, AppResult};
use grounder_pipeline::{AnswerSynthesizer, EvidenceSelector, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Grounder - web-search-grounded question answering with citations
#[derive(Parser, Debug)]
#[command(name = "grounder")]
#[command(about = "Web-search-grounded question answering with citations", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "GROUNDER_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "GROUNDER_PORT")]
    port: Option<u16>,

    /// Path to config file
    #[arg(short, long, env = "GROUNDER_CONFIG")]
    config: Option<PathBuf>,

    /// Web search provider (tavily, brave)
    #[arg(long, env = "GROUNDER_SEARCH_PROVIDER")]
    search_provider: Option<String>,

    /// Generation provider (openai, ollama)
    #[arg(long, env = "GROUNDER_LLM_PROVIDER")]
    llm_provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, env = "GROUNDER_MODEL")]
    model: Option<String>,

    /// Embedding provider (openai, ollama, trigram)
    #[arg(long, env = "GROUNDER_EMBEDDING_PROVIDER")]
    embedding_provider: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // The config file path must be visible to AppConfig::load
    if let Some(ref config) = cli.config {
        std::env::set_var("GROUNDER_CONFIG", config);
    }

    let config = AppConfig::load()?.with_overrides(
        cli.bind,
        cli.port,
        cli.search_provider,
        cli.llm_provider,
        cli.model,
        cli.embedding_provider,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Grounder server starting");
    tracing::debug!(search = %config.search_provider, "Search provider");
    tracing::debug!(llm = %config.llm_provider, model = %config.model, "Generation provider");
    tracing::debug!(embedding = %config.embedding_provider, model = %config.embedding_model, "Embedding provider");

    // Build the provider stack
    let search = grounder_search::create_provider(&config.search_provider)?;
    let embedder = grounder_pipeline::create_embedding_provider(
        &config.embedding_provider,
        &config.embedding_model,
        None,
    )?;
    let llm = grounder_llm::create_client(&config.llm_provider, None, None)?;

    let sessions = Arc::new(SessionStore::new());

    let state = web::Data::new(AppState {
        selector: EvidenceSelector::new(search, embedder),
        synthesizer: AnswerSynthesizer::new(
            llm,
            Arc::clone(&sessions),
            config.model.clone(),
            config.temperature,
            config.max_tokens,
        ),
        sessions,
        num_results: config.num_results,
        top_k: config.top_k,
    });

    let bind = (config.bind.clone(), config.port);
    tracing::info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .service(routes::ask_stream)
            .service(routes::ask_sources)
            .service(routes::health)
    })
    .bind(bind)?
    .run()
    .await?;

    tracing::info!("Grounder server stopped");
    Ok(())
}
