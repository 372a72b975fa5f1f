//! Application configuration for BidFlow.
//!
//! User config lives at `~/.bidflow/bidflow.toml`.
//! CLI flags override config file values, which override defaults.
//! The model API key itself is only ever read from the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BidFlowError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bidflow.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bidflow";

// ---------------------------------------------------------------------------
// Config structs (matching bidflow.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language-model backend settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Business profile source.
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Context window policy for the decomposition stage.
    #[serde(default)]
    pub context: ContextConfig,

    /// Submission export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible inference endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature. Kept low for requirement mapping.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient backend failures (0 disables retrying).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f64 {
    0.1
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    500
}

/// `[profile]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Path of the plain-text business profile, relative to the working directory.
    #[serde(default = "default_profile_path")]
    pub path: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            path: default_profile_path(),
        }
    }
}

fn default_profile_path() -> String {
    "business_profile.txt".into()
}

/// How the Vault is fitted into the decomposition prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextStrategy {
    /// Keep the first `max_chars` characters and mark the cut.
    Truncate,
    /// Analyse the Vault in `max_chars` chunks, up to `max_chunks`.
    Chunked,
}

impl std::fmt::Display for ContextStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncate => write!(f, "truncate"),
            Self::Chunked => write!(f, "chunked"),
        }
    }
}

/// `[context]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum characters of Vault text per analyst prompt.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Windowing strategy.
    #[serde(default = "default_strategy")]
    pub strategy: ContextStrategy,

    /// Upper bound on analyst passes when chunking.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            strategy: default_strategy(),
            max_chunks: default_max_chunks(),
        }
    }
}

fn default_max_chars() -> usize {
    15_000
}
fn default_strategy() -> ContextStrategy {
    ContextStrategy::Chunked
}
fn default_max_chunks() -> usize {
    4
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Fixed file name of the downloadable submission pack.
    #[serde(default = "default_export_file_name")]
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_export_file_name(),
        }
    }
}

fn default_export_file_name() -> String {
    "Global_BidFlow_Submission.txt".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bidflow/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BidFlowError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bidflow/bidflow.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BidFlowError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        BidFlowError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BidFlowError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BidFlowError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BidFlowError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would make the pipeline misbehave at run time.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    url::Url::parse(&config.llm.base_url).map_err(|e| {
        BidFlowError::config(format!("invalid llm.base_url '{}': {e}", config.llm.base_url))
    })?;

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        return Err(BidFlowError::config(format!(
            "llm.temperature must be between 0.0 and 2.0, got {}",
            config.llm.temperature
        )));
    }
    if config.context.max_chars == 0 {
        return Err(BidFlowError::config("context.max_chars must be greater than 0"));
    }
    if config.context.max_chunks == 0 {
        return Err(BidFlowError::config("context.max_chunks must be greater than 0"));
    }
    if config.export.file_name.trim().is_empty() {
        return Err(BidFlowError::config("export.file_name must not be empty"));
    }
    Ok(())
}

/// Read the model API key from the environment variable named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(BidFlowError::config(format!(
            "model API key not found. Set the {var_name} environment variable \
             (a .env file in the working directory is also read)."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("GROQ_API_KEY"));
        assert!(toml_str.contains("Global_BidFlow_Submission.txt"));
        assert!(toml_str.contains("strategy = \"chunked\""));
    }

    #[test]
    fn config_roundtrip_keeps_defaults() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.llm.temperature, 0.1);
        assert_eq!(parsed.context.max_chars, 15_000);
        assert_eq!(parsed.profile.path, "business_profile.txt");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[llm]
model = "mixtral-8x7b"

[context]
strategy = "truncate"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.llm.model, "mixtral-8x7b");
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.context.strategy, ContextStrategy::Truncate);
        assert_eq!(config.context.max_chunks, 4);
    }

    #[test]
    fn load_config_from_rejects_bad_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bidflow.toml");
        std::fs::write(&path, "[llm]\ntemperature = 5.0\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn load_config_from_rejects_bad_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bidflow.toml");
        std::fs::write(&path, "[llm]\nbase_url = \"not a url\"\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn api_key_resolution() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.llm.api_key_env = "BIDFLOW_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
