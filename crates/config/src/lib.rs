//! Configuration loading, validation, and management for EduGuardian.
//!
//! Loads configuration from `~/.eduguardian/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Upper bound for `pipeline.max_tutor_iterations`.
///
/// A run executes at most `2 * max_tutor_iterations + 4` steps, which must
/// stay within the pipeline's step ceiling.
pub const MAX_TUTOR_ITERATIONS: u32 = 10;

/// The root configuration structure.
///
/// Maps directly to `~/.eduguardian/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the text-generation provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Lesson pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Checkpoint store configuration
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("search", &self.search)
            .field("pipeline", &self.pipeline)
            .field("checkpoint", &self.checkpoint)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("max_results", &self.max_results)
            .field("include_images", &self.include_images)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// "tavily" or "offline"
    #[serde(default = "default_search_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_true")]
    pub include_images: bool,
}

fn default_search_provider() -> String {
    "tavily".into()
}
fn default_max_results() -> usize {
    2
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            api_key: None,
            api_url: None,
            max_results: default_max_results(),
            include_images: true,
        }
    }
}

/// A canned fact served by the Sentinel step when its trigger appears in a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFact {
    pub trigger: String,
    pub fact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Judge scores below this send the lesson back to the Tutor
    #[serde(default = "default_faithfulness_threshold")]
    pub faithfulness_threshold: f64,

    /// Maximum Tutor invocations per run
    #[serde(default = "default_max_tutor_iterations")]
    pub max_tutor_iterations: u32,

    /// Score assumed when the Judge reply has no parseable number
    #[serde(default = "default_fallback_score")]
    pub fallback_score: f64,

    /// Per-call timeout for every collaborator request
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Continue without context when the web search fails
    #[serde(default = "default_true")]
    pub degrade_on_search_failure: bool,

    /// Profile used when neither the request nor the thread supplies one
    #[serde(default = "default_student_profile")]
    pub default_student_profile: String,

    /// Local knowledge table checked by the Sentinel
    #[serde(default = "default_local_knowledge")]
    pub local_knowledge: Vec<LocalFact>,
}

fn default_faithfulness_threshold() -> f64 {
    0.7
}
fn default_max_tutor_iterations() -> u32 {
    2
}
fn default_fallback_score() -> f64 {
    0.9
}
fn default_step_timeout_secs() -> u64 {
    60
}
fn default_student_profile() -> String {
    "Curious learner. Enjoys everyday analogies and visual explanations.".into()
}
fn default_local_knowledge() -> Vec<LocalFact> {
    vec![LocalFact {
        trigger: "photosynthesis".into(),
        fact: "Plants use sunlight to make food (glucose).".into(),
    }]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            faithfulness_threshold: default_faithfulness_threshold(),
            max_tutor_iterations: default_max_tutor_iterations(),
            fallback_score: default_fallback_score(),
            step_timeout_secs: default_step_timeout_secs(),
            degrade_on_search_failure: true,
            default_student_profile: default_student_profile(),
            local_knowledge: default_local_knowledge(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// "memory", "file" or "sqlite"
    #[serde(default = "default_checkpoint_backend")]
    pub backend: String,

    /// Storage location for the file and sqlite backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Finished lessons kept per thread
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_checkpoint_backend() -> String {
    "memory".into()
}
fn default_max_turns() -> usize {
    20
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: default_checkpoint_backend(),
            path: None,
            max_turns: default_max_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.eduguardian/config.toml).
    ///
    /// Also checks environment variables:
    /// - `EDUGUARDIAN_API_KEY` (highest priority), `GROQ_API_KEY`, `OPENAI_API_KEY`
    /// - `EDUGUARDIAN_PROVIDER`, `EDUGUARDIAN_MODEL`
    /// - `TAVILY_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("EDUGUARDIAN_API_KEY")
                .or_else(|| lookup("GROQ_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("EDUGUARDIAN_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("EDUGUARDIAN_MODEL") {
            self.default_model = model;
        }

        if self.search.api_key.is_none() {
            self.search.api_key = lookup("TAVILY_API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".eduguardian")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.pipeline.faithfulness_threshold) {
            return Err(ConfigError::ValidationError(
                "pipeline.faithfulness_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.pipeline.fallback_score) {
            return Err(ConfigError::ValidationError(
                "pipeline.fallback_score must be between 0.0 and 1.0".into(),
            ));
        }

        if self.pipeline.step_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.step_timeout_secs must be > 0".into(),
            ));
        }

        if !(1..=MAX_TUTOR_ITERATIONS).contains(&self.pipeline.max_tutor_iterations) {
            return Err(ConfigError::ValidationError(format!(
                "pipeline.max_tutor_iterations must be between 1 and {MAX_TUTOR_ITERATIONS}"
            )));
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "search.max_results must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// A copy with every API key masked, safe to print.
    pub fn redacted(&self) -> Self {
        fn mask(key: &Option<String>) -> Option<String> {
            key.as_ref().map(|_| "***".to_string())
        }

        let mut copy = self.clone();
        copy.api_key = mask(&self.api_key);
        copy.search.api_key = mask(&self.search.api_key);
        for provider in copy.providers.values_mut() {
            provider.api_key = mask(&provider.api_key);
        }
        copy
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            search: SearchConfig::default(),
            pipeline: PipelineConfig::default(),
            checkpoint: CheckpointConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
