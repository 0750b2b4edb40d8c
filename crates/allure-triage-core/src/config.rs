//! Project configuration for Allure triage runs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::resolve::UnresolvedPolicy;

/// Environment variable overriding the configured username.
pub const USERNAME_ENV: &str = "ALLURE_TRIAGE_USERNAME";
/// Environment variable overriding the configured password.
pub const PASSWORD_ENV: &str = "ALLURE_TRIAGE_PASSWORD";

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Allure data endpoint, e.g. "http://ci.example.com/job/my-job/allure/data"
    pub base_url: String,

    /// Basic-auth username (env `ALLURE_TRIAGE_USERNAME` overrides)
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password (env `ALLURE_TRIAGE_PASSWORD` overrides)
    #[serde(default)]
    pub password: Option<String>,

    /// Directory for report files, created if absent
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// What to do with failed tests whose parent category cannot be found
    #[serde(default)]
    pub on_unresolved: UnresolvedPolicy,

    /// HTTP timeout in seconds (default 10)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/allure/data".to_string(),
            username: None,
            password: None,
            output_dir: default_output_dir(),
            on_unresolved: UnresolvedPolicy::default(),
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Load config from file and apply environment credential overrides.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let mut config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default location (.allure-triage.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [
            ".allure-triage.toml",
            ".allure-triage.json",
            "allure-triage.toml",
        ];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        // No config file, return default (env overrides still apply)
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Credentials from the environment take precedence over the file, so
    /// secrets never have to live in a checked-in config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(username) = std::env::var(USERNAME_ENV) {
            self.username = Some(username);
        }
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            self.password = Some(password);
        }
    }

    /// Basic-auth pair, when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.clone(), p.clone())),
            _ => None,
        }
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# allure-triage configuration

# Allure data endpoint of your CI job
base_url = "http://ci.example.com/job/my-job/allure/data"

# Directory for report files (created if absent)
output_dir = "reports"

# Basic-auth credentials. Prefer the environment:
#   ALLURE_TRIAGE_USERNAME / ALLURE_TRIAGE_PASSWORD
# username = "ci-bot"
# password = "secret"

# Failed tests whose parent category cannot be found:
# "drop" discards the record, "keep" records it with an
# "Unknown Reason" placeholder. Both warn on stderr.
on_unresolved = "drop"

# HTTP timeout in seconds (default: 10)
# timeout_secs = 10
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
