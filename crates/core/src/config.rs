//! Configuration management for ComAI.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.comai/config.yaml` or `$COMAI_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Providers reachable through the OpenAI-compatible chat completions API.
pub const KNOWN_PROVIDERS: [&str; 4] = ["together", "openai", "openai-compatible", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .comai/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub server: ServerConfig,

    pub llm: LlmSettings,

    pub retriever: RetrieverConfig,

    pub pipeline: PipelineConfig,

    /// Phrases answered with a canned reply instead of retrieval
    pub casual: Vec<CasualPhrase>,
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Language-model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Provider name (see [`KNOWN_PROVIDERS`])
    pub provider: String,

    /// Base URL of the OpenAI-compatible API; provider default when absent
    pub endpoint: Option<String>,

    /// API key. Prefer `COMAI_LLM_API_KEY` over writing it to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling for answer generation
    pub answer: Sampling,

    /// Sampling for follow-up generation
    pub follow_up: Sampling,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "together".to_string(),
            endpoint: None,
            api_key: None,
            model: "mistralai/Mixtral-8x7B-Instruct-v0.1".to_string(),
            timeout_secs: 60,
            answer: Sampling::default(),
            follow_up: Sampling::default(),
        }
    }
}

/// Sampling parameters for one kind of completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: Option<u32>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            max_tokens: None,
        }
    }
}

/// Vector store and embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrieverConfig {
    /// Qdrant REST endpoint
    pub qdrant_url: String,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Collection holding the pre-ingested documents
    pub collection: String,

    /// Payload key holding passage text
    pub content_payload_key: String,

    /// Dotted payload path holding the source identifier
    pub source_payload_key: String,

    /// Number of passages to retrieve per query
    pub top_k: usize,

    pub timeout_secs: u64,

    pub embedding: EmbeddingSettings,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "website_rag".to_string(),
            content_payload_key: "page_content".to_string(),
            source_payload_key: "metadata.source".to_string(),
            top_k: 4,
            timeout_secs: 30,
            embedding: EmbeddingSettings::default(),
        }
    }
}

/// Query embedding endpoint (OpenAI-compatible `/embeddings`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            api_key: None,
        }
    }
}

/// Pipeline toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Inject the caller's memory context into the answer prompt
    pub memory_context: bool,

    /// Generate follow-up suggestions
    pub follow_ups: bool,

    /// Pacing between streamed tokens, in milliseconds
    pub token_delay_ms: u64,

    /// Directory with prompt YAML files overriding the built-in ones
    pub prompts_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            memory_context: true,
            follow_ups: true,
            token_delay_ms: 2,
            prompts_dir: None,
        }
    }
}

/// One entry of the casual-phrase table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualPhrase {
    /// Exact text to match (compared lower-cased and trimmed)
    pub phrase: String,

    /// Canned reply returned on match
    pub reply: String,
}

impl CasualPhrase {
    pub fn new(phrase: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            reply: reply.into(),
        }
    }
}

/// The built-in casual-phrase table.
pub fn default_casual_phrases() -> Vec<CasualPhrase> {
    vec![
        CasualPhrase::new("okay", "Okay! Let me know if you need anything else."),
        CasualPhrase::new("ok", "Okay! Let me know if you need anything else."),
        CasualPhrase::new("thanks", "You're very welcome!"),
        CasualPhrase::new("thank you", "Happy to help!"),
        CasualPhrase::new(
            "hi",
            "Hey there! What would you like to know about Commedia?",
        ),
        CasualPhrase::new("hello", "Hello! Ask me anything about Commedia Solutions."),
        CasualPhrase::new(
            "hey",
            "Hey there! What would you like to know about Commedia?",
        ),
    ]
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
    server: Option<ServerConfig>,
    llm: Option<LlmSettings>,
    retriever: Option<RetrieverConfig>,
    pipeline: Option<PipelineConfig>,
    casual: Option<Vec<CasualPhrase>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            log_format: LogFormat::Pretty,
            verbose: false,
            no_color: false,
            server: ServerConfig::default(),
            llm: LlmSettings::default(),
            retriever: RetrieverConfig::default(),
            pipeline: PipelineConfig::default(),
            casual: default_casual_phrases(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and the
    /// environment.
    ///
    /// Environment variables:
    /// - `COMAI_WORKSPACE`: Override workspace path
    /// - `COMAI_CONFIG`: Path to config file
    /// - `COMAI_BIND`: Listen address
    /// - `COMAI_PROVIDER`, `COMAI_MODEL`: LLM provider and model
    /// - `COMAI_LLM_ENDPOINT` / `TOGETHER_API_BASE`: LLM base URL
    /// - `COMAI_LLM_API_KEY` / `TOGETHER_API_KEY`: LLM API key
    /// - `COMAI_QDRANT_URL`, `COMAI_COLLECTION`: vector store
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use comai_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Model: {}", config.llm.model);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `COMAI_WORKSPACE` and `COMAI_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var_os("COMAI_WORKSPACE").map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var_os("COMAI_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.comai_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env();

        Ok(config)
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) {
        if let Ok(bind) = std::env::var("COMAI_BIND") {
            self.server.bind = bind;
        }

        if let Ok(provider) = std::env::var("COMAI_PROVIDER") {
            self.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("COMAI_MODEL") {
            self.llm.model = model;
        }

        if let Some(endpoint) = first_env(&["COMAI_LLM_ENDPOINT", "TOGETHER_API_BASE"]) {
            self.llm.endpoint = Some(endpoint);
        }

        if let Some(key) = first_env(&["COMAI_LLM_API_KEY", "TOGETHER_API_KEY"]) {
            self.llm.api_key = Some(key);
        }

        if let Ok(url) = std::env::var("COMAI_QDRANT_URL") {
            self.retriever.qdrant_url = url;
        }

        if let Ok(key) = std::env::var("COMAI_QDRANT_API_KEY") {
            self.retriever.api_key = Some(key);
        }

        if let Ok(collection) = std::env::var("COMAI_COLLECTION") {
            self.retriever.collection = collection;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(server) = config_file.server {
            result.server = server;
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }

        if let Some(retriever) = config_file.retriever {
            result.retriever = retriever;
        }

        if let Some(pipeline) = config_file.pipeline {
            result.pipeline = pipeline;
        }

        if let Some(casual) = config_file.casual {
            result.casual = casual;
        }

        tracing::debug!("Merged config file {:?}", path);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }

        if let Some(provider) = overrides.provider {
            self.llm.provider = provider;
        }

        if let Some(model) = overrides.model {
            self.llm.model = model;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        } else if overrides.verbose {
            // Beats env and file levels, not an explicit --log-level
            self.log_level = Some("debug".to_string());
        }

        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }

        if overrides.verbose {
            self.verbose = true;
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .comai directory.
    pub fn comai_dir(&self) -> PathBuf {
        self.workspace.join(".comai")
    }

    /// Directory searched for prompt overrides, if any.
    pub fn prompts_dir(&self) -> Option<PathBuf> {
        self.pipeline.prompts_dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                self.workspace.join(dir)
            }
        })
    }

    /// Validate configuration before any upstream connection is attempted.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if matches!(provider.as_str(), "together" | "openai") && self.llm.api_key.is_none() {
            return Err(AppError::Config(format!(
                "Provider '{}' requires an API key (set COMAI_LLM_API_KEY or TOGETHER_API_KEY)",
                self.llm.provider
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(AppError::Config("LLM model cannot be empty".to_string()));
        }

        validate_sampling("answer", &self.llm.answer)?;
        validate_sampling("followUp", &self.llm.follow_up)?;

        if self.retriever.top_k == 0 {
            return Err(AppError::Config(
                "retriever.topK must be at least 1".to_string(),
            ));
        }

        if self.retriever.collection.trim().is_empty() {
            return Err(AppError::Config(
                "retriever.collection cannot be empty".to_string(),
            ));
        }

        for entry in &self.casual {
            if entry.phrase.trim().is_empty() || entry.reply.is_empty() {
                return Err(AppError::Config(
                    "Casual phrases and replies cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Command-line flags that override loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub verbose: bool,
    pub no_color: bool,
}

fn validate_sampling(name: &str, sampling: &Sampling) -> AppResult<()> {
    if !(0.0..=2.0).contains(&sampling.temperature) {
        return Err(AppError::Config(format!(
            "llm.{}.temperature must be within 0.0-2.0, got {}",
            name, sampling.temperature
        )));
    }

    if !(sampling.top_p > 0.0 && sampling.top_p <= 1.0) {
        return Err(AppError::Config(format!(
            "llm.{}.topP must be within (0.0, 1.0], got {}",
            name, sampling.top_p
        )));
    }

    Ok(())
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("test-key".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "together");
        assert_eq!(config.llm.model, "mistralai/Mixtral-8x7B-Instruct-v0.1");
        assert_eq!(config.retriever.collection, "website_rag");
        assert_eq!(config.retriever.top_k, 4);
        assert!(config.pipeline.memory_context);
        assert!(config.pipeline.follow_ups);
        assert_eq!(config.casual.len(), 7);
        assert!(!config.verbose);
    }

    #[test]
    fn test_load_from_workspace_config() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".comai")).unwrap();
        std::fs::write(
            temp.path().join(".comai/config.yaml"),
            "retriever:\n  collection: commedia_docs\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();

        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.retriever.collection, "commedia_docs");
    }

    #[test]
    fn test_load_from_missing_explicit_config_file() {
        let temp = TempDir::new().unwrap();

        let result = AppConfig::load_from(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("missing.yaml")),
        );

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_default_casual_table() {
        let config = AppConfig::default();
        assert!(config
            .casual
            .contains(&CasualPhrase::new("thanks", "You're very welcome!")));
        assert!(config
            .casual
            .contains(&CasualPhrase::new("thank you", "Happy to help!")));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(CliOverrides {
            bind: Some("127.0.0.1:9000".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            verbose: true,
            ..Default::default()
        });

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_verbose_overrides_configured_level() {
        let mut config = AppConfig::default();
        config.log_level = Some("warn".to_string());

        let config = config.with_overrides(CliOverrides {
            verbose: true,
            ..Default::default()
        });
        assert_eq!(config.log_level, Some("debug".to_string()));

        let config = config.with_overrides(CliOverrides {
            log_level: Some("trace".to_string()),
            verbose: true,
            ..Default::default()
        });
        assert_eq!(config.log_level, Some("trace".to_string()));
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
logging:
  level: warn
  format: json
llm:
  model: meta-llama/Llama-3-8b-chat-hf
  followUp:
    temperature: 0.7
retriever:
  topK: 8
pipeline:
  tokenDelayMs: 0
  followUps: false
casual:
  - phrase: hola
    reply: "¡Hola!"
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();

        assert_eq!(config.log_level, Some("warn".to_string()));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.llm.model, "meta-llama/Llama-3-8b-chat-hf");
        assert_eq!(config.llm.follow_up.temperature, 0.7);
        assert_eq!(config.llm.follow_up.top_p, 0.95);
        assert_eq!(config.llm.answer.temperature, 0.2);
        assert_eq!(config.llm.provider, "together");
        assert_eq!(config.retriever.top_k, 8);
        assert_eq!(config.retriever.collection, "website_rag");
        assert_eq!(config.pipeline.token_delay_ms, 0);
        assert!(!config.pipeline.follow_ups);
        assert!(config.pipeline.memory_context);
        assert_eq!(config.casual, vec![CasualPhrase::new("hola", "¡Hola!")]);
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "retriever: [not, a, map]").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_prompts_dir_relative_to_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/comai");
        config.pipeline.prompts_dir = Some(PathBuf::from("prompts"));
        assert_eq!(config.prompts_dir(), Some(PathBuf::from("/srv/comai/prompts")));
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = valid_config();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_hosted_provider_requires_key() {
        let mut config = valid_config();
        config.llm.api_key = None;
        assert!(config.validate().is_err());

        config.llm.provider = "ollama".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sampling_range() {
        let mut config = valid_config();
        config.llm.follow_up.top_p = 0.0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.llm.answer.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_top_k_and_casual() {
        let mut config = valid_config();
        config.retriever.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.casual.push(CasualPhrase::new("  ", "hi"));
        assert!(config.validate().is_err());
    }
}
