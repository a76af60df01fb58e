/*!
 * Configuration support for the doctor directory
 *
 * Provides runtime configuration for where the catalog comes from and how
 * it is loaded.
 */

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ENDPOINT, MAX_SUGGESTIONS};
use crate::normalizer::MalformedRecordPolicy;

/// Configuration for loading and presenting the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// URL of the JSON provider endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for the catalog fetch in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Custom user agent string
    #[serde(default)]
    pub user_agent: Option<String>,

    /// What to do with records whose fee or experience cannot be parsed
    #[serde(default)]
    pub malformed_record_policy: MalformedRecordPolicy,

    /// Number of name suggestions to offer (never more than three)
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Whether to show a spinner while fetching
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: None,
            malformed_record_policy: MalformedRecordPolicy::Skip,
            max_suggestions: default_max_suggestions(),
            show_progress: default_show_progress(),
        }
    }
}

// Default value functions for serde
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_suggestions() -> usize {
    MAX_SUGGESTIONS
}

fn default_show_progress() -> bool {
    true
}

impl DirectoryConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `DOCDIR_ENDPOINT`: provider endpoint URL
    /// - `DOCDIR_TIMEOUT_SECONDS`: number
    /// - `DOCDIR_USER_AGENT`: string
    /// - `DOCDIR_MALFORMED_RECORD_POLICY`: "skip" or "reject"
    /// - `DOCDIR_MAX_SUGGESTIONS`: number
    /// - `DOCDIR_SHOW_PROGRESS`: "true" or "false"
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DOCDIR_ENDPOINT") {
            config.endpoint = val;
        }

        if let Ok(val) = std::env::var("DOCDIR_TIMEOUT_SECONDS") {
            if let Ok(secs) = val.parse() {
                config.timeout_seconds = secs;
            }
        }

        if let Ok(val) = std::env::var("DOCDIR_USER_AGENT") {
            config.user_agent = Some(val);
        }

        if let Ok(val) = std::env::var("DOCDIR_MALFORMED_RECORD_POLICY") {
            if let Some(policy) = MalformedRecordPolicy::from_name(&val) {
                config.malformed_record_policy = policy;
            }
        }

        if let Ok(val) = std::env::var("DOCDIR_MAX_SUGGESTIONS") {
            if let Ok(n) = val.parse() {
                config.max_suggestions = n;
            }
        }

        if let Ok(val) = std::env::var("DOCDIR_SHOW_PROGRESS") {
            config.show_progress = val.to_lowercase() == "true";
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::DirectoryError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML format".to_string()),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::DirectoryError::Configuration {
                message: format!("Failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/doctor-directory/config.toml` on Linux
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "doctor-directory")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Layer built-in defaults, an optional TOML file, and `DOCDIR_*`
    /// environment variables, in increasing priority.
    pub fn load_layered(file: Option<&Path>) -> crate::Result<Self> {
        let defaults = ::config::Config::try_from(&Self::default())?;
        let mut builder = ::config::Config::builder().add_source(defaults);

        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        let layered = builder
            .add_source(::config::Environment::with_prefix("DOCDIR").try_parsing(true))
            .build()?;

        Ok(layered.try_deserialize()?)
    }

    /// Load configuration from the default location and the environment,
    /// falling back to defaults if the file is unreadable
    pub fn load() -> Self {
        let path = Self::default_config_path();
        Self::load_layered(path.as_deref()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable configuration");
            Self::from_env()
        })
    }

    /// Suggestions to request from the engine, capped at the engine maximum
    pub fn suggestion_limit(&self) -> usize {
        self.max_suggestions.min(MAX_SUGGESTIONS)
    }
}

/// Builder for customizing configuration
#[derive(Default)]
pub struct ConfigBuilder {
    config: DirectoryConfig,
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.config.timeout_seconds = secs;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn malformed_record_policy(mut self, policy: MalformedRecordPolicy) -> Self {
        self.config.malformed_record_policy = policy;
        self
    }

    pub fn max_suggestions(mut self, n: usize) -> Self {
        self.config.max_suggestions = n;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    /// Build the configuration
    pub fn build(self) -> DirectoryConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DirectoryConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.malformed_record_policy, MalformedRecordPolicy::Skip);
        assert_eq!(config.suggestion_limit(), 3);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .endpoint("http://localhost:8080/doctors.json")
            .timeout_seconds(5)
            .malformed_record_policy(MalformedRecordPolicy::Reject)
            .max_suggestions(10)
            .show_progress(false)
            .build();

        assert_eq!(config.endpoint, "http://localhost:8080/doctors.json");
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.malformed_record_policy, MalformedRecordPolicy::Reject);
        assert_eq!(config.suggestion_limit(), 3);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ConfigBuilder::new().max_suggestions(2).build();
        config.save(&path).unwrap();
        assert_eq!(DirectoryConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_layered_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_seconds = 7\nmalformed_record_policy = \"reject\"\n").unwrap();
        let config = DirectoryConfig::load_layered(Some(&path)).unwrap();
        assert_eq!(config.timeout_seconds, 7);
        assert_eq!(config.malformed_record_policy, MalformedRecordPolicy::Reject);
        assert_eq!(config.max_suggestions, 3);
    }
}
