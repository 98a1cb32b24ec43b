use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "BoardLens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "BOARDLENS_CONFIG";

/// Get the application data directory
/// ~/BoardLens/ on all platforms. Falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite location.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("boardlens.db")
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "boardlens=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_filter: Option<String>,
    pub generation: GenerationConfig,
    pub pipeline: PipelineConfig,
    pub users: Vec<UserConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_filter: None,
            generation: GenerationConfig::default(),
            pipeline: PipelineConfig::default(),
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Ollama base URL.
    pub base_url: String,
    pub model: String,
    /// Upper bound for a single agent call.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.1:8b".into(),
            timeout_secs: 120,
        }
    }
}

/// Tunables for validation, cross-document grouping and review.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub min_quote_chars: usize,
    pub max_quote_chars: usize,
    /// Findings whose reviewed confidence falls below this are flagged.
    pub review_threshold: f64,
    /// Title similarity needed to group findings across documents.
    pub similarity_threshold: f64,
    /// Fraction of the gap between stated confidence and evidence quality
    /// that the reviewer takes away.
    pub confidence_penalty: f64,
    /// Quote length (in words) that counts as fully specific.
    pub specific_quote_words: usize,
    /// Cap on prior findings summarized into each agent's context.
    pub max_prior_findings: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_quote_chars: 10,
            max_quote_chars: 500,
            review_threshold: 0.5,
            similarity_threshold: 0.6,
            confidence_penalty: 0.75,
            specific_quote_words: 12,
            max_prior_findings: 40,
        }
    }
}

/// One board-portal user and what they may do.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Document ids this user may read. `"*"` grants every document.
    #[serde(default)]
    pub documents: Vec<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Explicit path wins, then `BOARDLENS_CONFIG`, then defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(default_log_filter())
    }
}
