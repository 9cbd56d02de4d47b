use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LecternError, Result};

/// Main configuration structure for Lectern
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Tier capacities and the token budget
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Token counting strategy
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    /// Summary generation for folded turns
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

impl Config {
    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LecternError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| LecternError::Config(format!("Failed to parse config: {e}")))?;
        config.memory.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, or search the default locations
    ///
    /// Falls back to defaults when no config file exists anywhere.
    pub fn discover(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::load(path);
        }

        for path in default_config_paths() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load(&path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}

/// Locations searched by [`Config::discover`], in priority order
pub fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::home_dir().map(|h| h.join(".lectern").join("config.toml")),
        dirs::config_dir().map(|c| c.join("lectern").join("config.toml")),
        Some(PathBuf::from("config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Tier sizing and compression budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum raw turns kept in L1, and the size of every folded batch
    #[serde(default = "default_l1_capacity")]
    pub l1_capacity: usize,
    /// Maximum summaries kept in L2
    #[serde(default = "default_l2_capacity")]
    pub l2_capacity: usize,
    /// Token total above which a compression pass runs
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: usize,
    /// Per-turn character cap used by the local fallback summary
    #[serde(default = "default_summary_char_cap")]
    pub summary_char_cap: usize,
    /// Words that mark a turn as a question even without a question mark
    #[serde(default = "default_question_particles")]
    pub question_particles: Vec<String>,
    /// Longest wait for one summary before the local fallback is used
    #[serde(default = "default_summary_timeout_ms")]
    pub summary_timeout_ms: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            l1_capacity: default_l1_capacity(),
            l2_capacity: default_l2_capacity(),
            compression_threshold: default_compression_threshold(),
            summary_char_cap: default_summary_char_cap(),
            question_particles: default_question_particles(),
            summary_timeout_ms: default_summary_timeout_ms(),
        }
    }
}

impl MemoryConfig {
    /// Build a config with explicit tier sizes and default everything else
    pub fn new(l1_capacity: usize, l2_capacity: usize, compression_threshold: usize) -> Self {
        Self {
            l1_capacity,
            l2_capacity,
            compression_threshold,
            ..Default::default()
        }
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_millis(self.summary_timeout_ms)
    }

    /// Reject capacities that would make the compression pass meaningless
    pub fn validate(&self) -> Result<()> {
        if self.l1_capacity == 0 {
            return Err(LecternError::Config(
                "memory.l1_capacity must be at least 1".to_string(),
            ));
        }
        if self.l2_capacity == 0 {
            return Err(LecternError::Config(
                "memory.l2_capacity must be at least 1".to_string(),
            ));
        }
        if self.summary_timeout_ms == 0 {
            return Err(LecternError::Config(
                "memory.summary_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_l1_capacity() -> usize {
    2
}

fn default_l2_capacity() -> usize {
    3
}

fn default_compression_threshold() -> usize {
    3000
}

fn default_summary_char_cap() -> usize {
    50
}

fn default_summary_timeout_ms() -> u64 {
    30_000
}

fn default_question_particles() -> Vec<String> {
    vec!["吗".to_string(), "呢".to_string()]
}

/// Which built-in counter prices a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerStrategy {
    /// CJK-aware character estimate
    #[default]
    Estimate,
    /// Whitespace word count
    Words,
    /// Four bytes per token
    Chars,
    /// Exact cl100k_base byte-pair encoding
    Bpe,
}

/// Token counting configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub strategy: TokenizerStrategy,
}

/// Which summarizer folds L1 batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerProvider {
    /// Deterministic local reduction only
    #[default]
    Local,
    /// Remote LLM, local reduction on failure
    Remote,
    /// Remote LLM first, then an explicit local secondary
    Fallback,
}

/// Summarizer configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SummarizerConfig {
    /// Provider type: local, remote, or fallback
    #[serde(default)]
    pub provider: SummarizerProvider,
    /// Remote API configuration
    #[serde(default)]
    pub remote: RemoteSummarizerConfig,
}

/// Remote API configuration for summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSummarizerConfig {
    /// API base URL (the client appends `/chat/completions`)
    #[serde(default = "default_remote_api_url")]
    pub api_url: String,
    /// Environment variable name for API key
    #[serde(default = "default_remote_api_key_env")]
    pub api_key_env: String,
    /// Model identifier for remote API
    #[serde(default = "default_remote_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per summary, first try included
    #[serde(default = "default_remote_max_retries")]
    pub max_retries: u32,
    /// Backoff before the second attempt; doubles after each retry
    #[serde(default = "default_remote_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for RemoteSummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: default_remote_api_url(),
            api_key_env: default_remote_api_key_env(),
            model: default_remote_model(),
            timeout_secs: default_remote_timeout_secs(),
            max_retries: default_remote_max_retries(),
            retry_base_delay_ms: default_remote_retry_base_delay_ms(),
        }
    }
}

fn default_remote_api_url() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
}

fn default_remote_api_key_env() -> String {
    "LECTERN_API_KEY".to_string()
}

fn default_remote_model() -> String {
    "qwen-plus".to_string()
}

fn default_remote_timeout_secs() -> u64 {
    30
}

fn default_remote_max_retries() -> u32 {
    3
}

fn default_remote_retry_base_delay_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.memory.l1_capacity, 2);
        assert_eq!(config.memory.l2_capacity, 3);
        assert_eq!(config.memory.compression_threshold, 3000);
        assert_eq!(config.memory.summary_char_cap, 50);
        assert_eq!(config.memory.question_particles, vec!["吗", "呢"]);
        assert_eq!(config.tokenizer.strategy, TokenizerStrategy::Estimate);
        assert_eq!(config.summarizer.provider, SummarizerProvider::Local);
        assert_eq!(config.summarizer.remote.api_key_env, "LECTERN_API_KEY");
        assert_eq!(config.summarizer.remote.model, "qwen-plus");
        assert_eq!(config.summarizer.remote.timeout_secs, 30);
        assert_eq!(config.summarizer.remote.max_retries, 3);
        assert_eq!(config.summarizer.remote.retry_base_delay_ms, 1000);
        assert_eq!(config.memory.summary_timeout_ms, 30_000);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[memory]
l1_capacity = 4
l2_capacity = 2
compression_threshold = 500
summary_char_cap = 80
question_particles = ["吗"]
summary_timeout_ms = 5000

[tokenizer]
strategy = "bpe"

[summarizer]
provider = "remote"

[summarizer.remote]
api_url = "https://api.openai.com/v1"
api_key_env = "OPENAI_API_KEY"
model = "gpt-4o-mini"
timeout_secs = 10
max_retries = 5
retry_base_delay_ms = 250
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.memory.l1_capacity, 4);
        assert_eq!(config.memory.l2_capacity, 2);
        assert_eq!(config.memory.compression_threshold, 500);
        assert_eq!(config.memory.summary_char_cap, 80);
        assert_eq!(config.memory.question_particles, vec!["吗"]);
        assert_eq!(config.memory.summary_timeout(), Duration::from_secs(5));
        assert_eq!(config.tokenizer.strategy, TokenizerStrategy::Bpe);
        assert_eq!(config.summarizer.provider, SummarizerProvider::Remote);
        assert_eq!(config.summarizer.remote.api_url, "https://api.openai.com/v1");
        assert_eq!(config.summarizer.remote.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.summarizer.remote.model, "gpt-4o-mini");
        assert_eq!(config.summarizer.remote.timeout_secs, 10);
        assert_eq!(config.summarizer.remote.max_retries, 5);
        assert_eq!(config.summarizer.remote.retry_base_delay_ms, 250);
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[memory]
compression_threshold = 100
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.memory.compression_threshold, 100);
        assert_eq!(config.memory.l1_capacity, 2);
        assert_eq!(config.memory.l2_capacity, 3);
        assert_eq!(config.summarizer.provider, SummarizerProvider::Local);
    }

    #[test]
    fn test_negative_threshold_is_rejected() {
        let toml_str = r#"
[memory]
compression_threshold = -1
"#;

        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let toml_str = r#"
[summarizer]
provider = "telepathy"
"#;

        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_capacities() {
        assert!(MemoryConfig::new(0, 3, 100).validate().is_err());
        assert!(MemoryConfig::new(2, 0, 100).validate().is_err());
        assert!(MemoryConfig::new(1, 1, 0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_summary_timeout() {
        let mut config = MemoryConfig::new(2, 3, 100);
        config.summary_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("summary_timeout_ms"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[memory]\nl1_capacity = 5\nl2_capacity = 5").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.memory.l1_capacity, 5);
        assert_eq!(config.memory.l2_capacity, 5);
    }

    #[test]
    fn test_load_rejects_zero_capacity_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[memory]\nl1_capacity = 0").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("l1_capacity"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/lectern/config.toml")).unwrap_err();
        assert!(matches!(err, LecternError::Config(_)));
    }

    #[test]
    fn test_discover_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tokenizer]\nstrategy = \"chars\"").unwrap();

        let config = Config::discover(Some(file.path())).unwrap();
        assert_eq!(config.tokenizer.strategy, TokenizerStrategy::Chars);
    }

    #[test]
    fn test_config_serializes_back_to_toml() {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.memory.l1_capacity, config.memory.l1_capacity);
        assert_eq!(parsed.summarizer.provider, config.summarizer.provider);
    }
}
