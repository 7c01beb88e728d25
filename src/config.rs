//! Configuration loading.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. JSON config file (`FINQ_CONFIG`, else `~/.finq/config.json` if present)
//! 3. Environment variables
//! 4. CLI flags (applied by the binary)

use crate::llm::client::LlmProvider;
use crate::llm::query_builder::DEFAULT_QUERY_MAX_TOKENS;
use crate::llm::summarizer::DEFAULT_SUMMARY_MAX_TOKENS;
use crate::query::gate::GateMode;
use crate::types::{FinqError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "bloomberg_mini.db";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Completion model; also selects the provider
    pub model: String,

    /// API key (falls back to the provider's environment variable)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// API root override for OpenAI-compatible servers
    pub base_url: Option<String>,

    /// Bound on each completion call
    pub timeout_secs: u64,

    /// Output budget for query synthesis
    pub query_max_tokens: u32,

    /// Output budget for summaries
    pub summary_max_tokens: u32,

    /// Safety gate strictness
    pub gate: GateMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            query_max_tokens: DEFAULT_QUERY_MAX_TOKENS,
            summary_max_tokens: DEFAULT_SUMMARY_MAX_TOKENS,
            gate: GateMode::default(),
        }
    }
}

/// Expand `~` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).to_string())
}

impl Config {
    /// Config file location.
    ///
    /// # Returns
    ///
    /// `FINQ_CONFIG` if set, else `~/.finq/config.json`; `None` if neither
    /// can be determined
    pub fn config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("FINQ_CONFIG") {
            return Some(expand_path(&path));
        }

        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".finq").join("config.json"))
    }

    /// Load configuration from defaults, config file and environment.
    ///
    /// A missing default config file is not an error; a missing file named
    /// by `FINQ_CONFIG` is.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("FINQ_CONFIG").is_ok();

        let mut config = match Self::config_file() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if explicit => {
                return Err(FinqError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )))
            }
            _ => Self::default(),
        };

        config.apply_vars(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Load configuration from a JSON file (missing keys keep defaults).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| FinqError::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        config.db_path = expand_path(&config.db_path.to_string_lossy());
        Ok(config)
    }

    /// Apply `FINQ_*` overrides from a variable source.
    ///
    /// # Arguments
    ///
    /// * `get` - Variable lookup (the process environment in production)
    ///
    /// # Errors
    ///
    /// Returns `FinqError::Config` for unparsable numeric or gate values
    pub fn apply_vars<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = get("FINQ_DB_PATH") {
            self.db_path = expand_path(&path);
        }
        if let Some(model) = get("FINQ_LLM_MODEL") {
            self.model = model;
        }
        if let Some(url) = get("FINQ_LLM_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(secs) = get("FINQ_LLM_TIMEOUT_SECS") {
            self.timeout_secs = secs.trim().parse().map_err(|_| {
                FinqError::Config(format!("FINQ_LLM_TIMEOUT_SECS must be a number, got '{}'", secs))
            })?;
        }
        if let Some(gate) = get("FINQ_GATE") {
            self.gate = gate.parse()?;
        }
        Ok(())
    }

    /// Provider selected by the configured model.
    pub fn provider(&self) -> LlmProvider {
        LlmProvider::from_model(&self.model)
    }

    /// API key: explicit value, else the provider's environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(self.provider().api_key_var()).ok())
            .filter(|key| !key.trim().is_empty())
    }
}
