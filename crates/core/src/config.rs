//! Configuration management for the grounder service.
//!
//! Configuration is merged from three sources, lowest precedence first:
//! - Built-in defaults
//! - A YAML config file (`grounder.yaml` in the working directory, or the
//!   path named by `GROUNDER_CONFIG`)
//! - Environment variables (`GROUNDER_*`)
//!
//! CLI flags are applied last via [`AppConfig::with_overrides`]. API keys
//! for the external providers are read from the environment by the
//! provider factories and never appear in this struct.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default bind address for the HTTP server.
const DEFAULT_BIND: &str = "0.0.0.0";

/// Default port for the HTTP server.
const DEFAULT_PORT: u16 = 8080;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind: String,

    /// Port the HTTP server listens on
    pub port: u16,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Web search provider ("tavily", "brave")
    pub search_provider: String,

    /// Generation provider ("openai", "ollama")
    pub llm_provider: String,

    /// Generation model identifier
    pub model: String,

    /// Embedding provider ("openai", "ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Raw results requested per search
    pub num_results: u32,

    /// Evidence items kept after similarity ranking
    pub top_k: usize,

    /// Sampling temperature for answer generation
    pub temperature: f32,

    /// Token cap for answer generation
    pub max_tokens: u32,

    /// Log level override
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    server: Option<ServerConfig>,
    search: Option<SearchConfig>,
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    answer: Option<AnswerConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    bind: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchConfig {
    provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnswerConfig {
    #[serde(rename = "numResults")]
    num_results: Option<u32>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            config_file: None,
            search_provider: "tavily".to_string(),
            llm_provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            embedding_provider: "openai".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            num_results: 8,
            top_k: 4,
            temperature: 0.2,
            max_tokens: 1000,
            log_level: None,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `GROUNDER_CONFIG`: path to the YAML config file
    /// - `GROUNDER_BIND` / `GROUNDER_PORT`: HTTP listen address
    /// - `GROUNDER_SEARCH_PROVIDER`: search provider name
    /// - `GROUNDER_LLM_PROVIDER` / `GROUNDER_MODEL`: generation provider
    /// - `GROUNDER_EMBEDDING_PROVIDER` / `GROUNDER_EMBEDDING_MODEL`
    /// - `RUST_LOG`: log level
    /// - `NO_COLOR`: disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("GROUNDER_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("grounder.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override the YAML file
        if let Ok(bind) = std::env::var("GROUNDER_BIND") {
            config.bind = bind;
        }

        if let Ok(port) = std::env::var("GROUNDER_PORT") {
            config.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid GROUNDER_PORT: {}", port)))?;
        }

        if let Ok(provider) = std::env::var("GROUNDER_SEARCH_PROVIDER") {
            config.search_provider = provider;
        }

        if let Ok(provider) = std::env::var("GROUNDER_LLM_PROVIDER") {
            config.llm_provider = provider;
        }

        if let Ok(model) = std::env::var("GROUNDER_MODEL") {
            config.model = model;
        }

        if let Ok(provider) = std::env::var("GROUNDER_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        if let Ok(model) = std::env::var("GROUNDER_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(server) = config_file.server {
            if let Some(bind) = server.bind {
                result.bind = bind;
            }
            if let Some(port) = server.port {
                result.port = port;
            }
        }

        if let Some(search) = config_file.search {
            if let Some(provider) = search.provider {
                result.search_provider = provider;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.llm_provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
        }

        if let Some(embedding) = config_file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
        }

        if let Some(answer) = config_file.answer {
            if let Some(num_results) = answer.num_results {
                result.num_results = num_results;
            }
            if let Some(top_k) = answer.top_k {
                result.top_k = top_k;
            }
            if let Some(temperature) = answer.temperature {
                result.temperature = temperature;
            }
            if let Some(max_tokens) = answer.max_tokens {
                result.max_tokens = max_tokens;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over both environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        bind: Option<String>,
        port: Option<u16>,
        search_provider: Option<String>,
        llm_provider: Option<String>,
        model: Option<String>,
        embedding_provider: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }

        if let Some(port) = port {
            self.port = port;
        }

        if let Some(provider) = search_provider {
            self.search_provider = provider;
        }

        if let Some(provider) = llm_provider {
            self.llm_provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(provider) = embedding_provider {
            self.embedding_provider = provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose && self.log_level.is_none() {
            self.log_level = Some("debug".to_string());
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate provider names before any network client is built.
    pub fn validate(&self) -> AppResult<()> {
        let known_search = ["tavily", "brave"];
        if !known_search.contains(&self.search_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown search provider: {}. Supported: {}",
                self.search_provider,
                known_search.join(", ")
            )));
        }

        let known_llm = ["openai", "ollama"];
        if !known_llm.contains(&self.llm_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                self.llm_provider,
                known_llm.join(", ")
            )));
        }

        let known_embedding = ["openai", "ollama", "trigram"];
        if !known_embedding.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_embedding.join(", ")
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        Ok(())
    }
}
