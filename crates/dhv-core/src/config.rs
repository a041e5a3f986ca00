use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Where and how the forecast page is fetched
    #[serde(default)]
    pub source: SourceConfig,

    /// Refresh scheduling and retry policy
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Forecast regions in display order
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionSetting>,

    /// Snapshot persistence
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Forecast page URL
    pub url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Network timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    20
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://www.dhv.de/wetter/dhv-wetter/".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:119.0) Gecko/20100101 Firefox/119.0"
                .to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// What to do when a recurring job with the same name is already registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Leave the existing schedule untouched
    #[default]
    Keep,
    /// Cancel the existing schedule and start over
    Replace,
}

/// Whether a fetch that yields no regions may overwrite the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptySnapshotPolicy {
    /// Count the attempt as failed and keep the previous snapshot
    #[default]
    Reject,
    /// Store the empty snapshot as a regular result
    Accept,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Fetch attempts per refresh before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (doubles each attempt)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for the retry delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Recurring refresh interval in minutes
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// Conflict handling for the recurring job
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Skip scheduled runs while the network is unreachable
    #[serde(default = "default_requires_network")]
    pub requires_network: bool,

    /// Handling of fetches that parse to zero regions
    #[serde(default)]
    pub empty_snapshot: EmptySnapshotPolicy,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    2000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_interval_minutes() -> u32 {
    180
}

fn default_requires_network() -> bool {
    true
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            interval_minutes: default_interval_minutes(),
            conflict_policy: ConflictPolicy::default(),
            requires_network: default_requires_network(),
            empty_snapshot: EmptySnapshotPolicy::default(),
        }
    }
}

/// A forecast region anchor as it appears on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSetting {
    /// Text searched for in the page headings (e.g. "Nordalpen")
    pub anchor: String,

    /// Short display code; derived from the anchor when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl RegionSetting {
    pub fn new(anchor: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into(),
            code: None,
        }
    }
}

fn default_regions() -> Vec<RegionSetting> {
    vec![
        RegionSetting::new("Deutschland"),
        RegionSetting::new("Nordalpen"),
        RegionSetting::new("Südalpen"),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file name, relative to the config directory
    pub database_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: "weather.db".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dhv-weather");

        Self {
            config_dir,
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
            regions: default_regions(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, writing defaults there if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.source.url, "source.url", &mut result);

        if self.source.user_agent.trim().is_empty() {
            result.add_warning("source.user_agent", "Empty User-Agent may be rejected");
        }

        if self.source.timeout_secs == 0 {
            result.add_error("source.timeout_secs", "Timeout must be greater than 0");
        }

        if self.refresh.max_attempts == 0 {
            result.add_error("refresh.max_attempts", "At least one attempt is required");
        }

        if self.refresh.initial_backoff_ms > self.refresh.max_backoff_ms {
            result.add_warning(
                "refresh.initial_backoff_ms",
                "Initial backoff exceeds the maximum and will be capped",
            );
        }

        if self.refresh.interval_minutes == 0 {
            result.add_error(
                "refresh.interval_minutes",
                "Refresh interval must be greater than 0",
            );
        } else if self.refresh.interval_minutes < 15 {
            result.add_warning(
                "refresh.interval_minutes",
                "Refreshing more often than every 15 minutes is unnecessary",
            );
        }

        if self.regions.is_empty() {
            result.add_error("regions", "At least one region is required");
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            if region.anchor.trim().is_empty() {
                result.add_error("regions.anchor", "Region anchor cannot be empty");
            } else if !seen.insert(region.anchor.as_str()) {
                result.add_warning(
                    "regions.anchor",
                    format!("Duplicate region anchor: {}", region.anchor),
                );
            }
        }

        if self.storage.database_file.trim().is_empty() {
            result.add_error("storage.database_file", "Database file name cannot be empty");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Absolute path of the snapshot database
    pub fn database_path(&self) -> PathBuf {
        self.config_dir.join(&self.storage.database_file)
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("dhv-weather");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_default_refresh_policy() {
        let refresh = RefreshConfig::default();
        assert_eq!(refresh.max_attempts, 3);
        assert_eq!(refresh.interval_minutes, 180);
        assert_eq!(refresh.conflict_policy, ConflictPolicy::Keep);
        assert_eq!(refresh.empty_snapshot, EmptySnapshotPolicy::Reject);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.source.url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "source.url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.source.url = "ftp://www.dhv.de/wetter".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_attempts_is_error() {
        let mut config = Config::default();
        config.refresh.max_attempts = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "refresh.max_attempts"));
    }

    #[test]
    fn test_empty_regions_is_error() {
        let mut config = Config::default();
        config.regions.clear();
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_duplicate_anchor_is_warning() {
        let mut config = Config::default();
        config.regions.push(RegionSetting::new("Nordalpen"));
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.message.contains("Nordalpen")));
    }

    #[test]
    fn test_policies_parse_from_toml() {
        let toml_str = r#"
            config_dir = "/tmp/dhv"

            [refresh]
            conflict_policy = "replace"
            empty_snapshot = "accept"

            [[regions]]
            anchor = "Westalpen"
            code = "WA"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.refresh.conflict_policy, ConflictPolicy::Replace);
        assert_eq!(config.refresh.empty_snapshot, EmptySnapshotPolicy::Accept);
        assert_eq!(config.refresh.max_attempts, 3);
        assert_eq!(config.regions.len(), 1);
        assert_eq!(config.regions[0].code.as_deref(), Some("WA"));
        assert_eq!(config.source.timeout_secs, 20);
    }

    #[test]
    fn test_load_from_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path().to_path_buf());
        assert_eq!(config.database_path(), dir.path().join("weather.db"));

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.regions, config.regions);
    }

    #[test]
    fn test_load_from_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_dir = [").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
