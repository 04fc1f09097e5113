//! Bot configuration module.
//!
//! Handles loading, validating, and merging `config.toml`, plus the secrets
//! that only ever come from the environment.
//!
//! ## Config File Location
//!
//! `config.toml` is read from the config directory (`--config-dir`, default
//! the working directory). The file is optional; without it stock defaults
//! apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! host = "0.0.0.0"          # Bind address for the webhook server
//! port = 10000              # Overridden by the PORT environment variable
//!
//! [analysis]
//! resolution = 512          # Square analysis grid edge (power of two, >= 8)
//! threshold = 127           # Pixels darker than this are crack pixels
//!
//! [line]
//! api_base = "https://api.line.me"
//! data_api_base = "https://api-data.line.me"
//! timeout_secs = 30
//!
//! [processing]
//! max_processes = 4         # Max parallel workers for `analyze` (omit for auto = CPU cores)
//! ```
//!
//! ## Environment
//!
//! | Variable | Used for |
//! |---|---|
//! | `LINE_CHANNEL_ACCESS_TOKEN` | Bearer token for content download and replies (required by `serve`) |
//! | `LINE_CHANNEL_SECRET` | HMAC key for webhook signatures (required by `serve`) |
//! | `PORT` | Overrides `server.port` |
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::analysis::{AnalysisParams, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// Bot configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    /// Webhook server bind settings.
    pub server: ServerConfig,
    /// Fractal analysis settings.
    pub analysis: AnalysisConfig,
    /// Messaging API endpoints.
    pub line: LineConfig,
    /// Parallel processing settings for the `analyze` command.
    pub processing: ProcessingConfig,
}

impl BotConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let resolution = self.analysis.resolution;
        if resolution < 8 || !resolution.is_power_of_two() {
            return Err(ConfigError::Validation(
                "analysis.resolution must be a power of two of at least 8".into(),
            ));
        }
        if self.analysis.threshold == 0 {
            return Err(ConfigError::Validation(
                "analysis.threshold must be 1-255".into(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.host must not be empty".into(),
            ));
        }
        for (key, url) in [
            ("line.api_base", &self.line.api_base),
            ("line.data_api_base", &self.line.data_api_base),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an http(s) URL"
                )));
            }
        }
        if self.line.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "line.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment overrides (`PORT`).
    ///
    /// `lookup` abstracts `std::env::var` so tests need not touch the
    /// process environment.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Validation(format!("PORT is not a valid port: {port}")))?;
        }
        Ok(())
    }
}

/// Webhook server bind settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

/// Fractal analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Edge of the square grid images are resampled to before counting.
    pub resolution: u32,
    /// Pixels with intensity strictly below this are crack pixels.
    pub threshold: u8,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    pub fn params(&self) -> AnalysisParams {
        AnalysisParams {
            resolution: self.resolution,
            threshold: self.threshold,
        }
    }
}

/// Messaging API endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineConfig {
    /// Base URL for the reply endpoint.
    pub api_base: String,
    /// Base URL for the message content endpoint.
    pub data_api_base: String,
    /// Global timeout for each API call, in seconds.
    pub timeout_secs: u64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.line.me".to_string(),
            data_api_base: "https://api-data.line.me".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel analysis workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Channel credentials. Never read from `config.toml`, never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub channel_access_token: String,
    pub channel_secret: String,
}

impl Secrets {
    pub const ACCESS_TOKEN_VAR: &'static str = "LINE_CHANNEL_ACCESS_TOKEN";
    pub const CHANNEL_SECRET_VAR: &'static str = "LINE_CHANNEL_SECRET";

    /// Read both secrets from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read both secrets through `lookup`; empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };
        Ok(Self {
            channel_access_token: require(Self::ACCESS_TOKEN_VAR)?,
            channel_secret: require(Self::CHANNEL_SECRET_VAR)?,
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("channel_access_token", &"<redacted>")
            .field("channel_secret", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BotConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BotConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BotConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<BotConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# crackscope configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Channel credentials are NOT read from this file. Set them in the
# environment instead:
#   LINE_CHANNEL_ACCESS_TOKEN   bearer token for content download and replies
#   LINE_CHANNEL_SECRET         key used to verify webhook signatures

# ---------------------------------------------------------------------------
# Webhook server
# ---------------------------------------------------------------------------
[server]
# Address to bind.
host = "0.0.0.0"

# Port to listen on. The PORT environment variable takes precedence.
port = 10000

# ---------------------------------------------------------------------------
# Fractal analysis
# ---------------------------------------------------------------------------
[analysis]
# Images are resampled to a square grid of this edge before box counting.
# Must be a power of two, at least 8. Box sizes run 2, 4, ... resolution/2.
resolution = 512

# Pixels with intensity strictly below this (0-255) count as crack pixels.
threshold = 127

# ---------------------------------------------------------------------------
# Messaging API
# ---------------------------------------------------------------------------
[line]
api_base = "https://api.line.me"
data_api_base = "https://api-data.line.me"

# Timeout for each API call, in seconds.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Processing (the `analyze` command)
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel analysis workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = BotConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.analysis.resolution, 512);
        assert_eq!(config.analysis.threshold, 127);
        assert_eq!(config.line.api_base, "https://api.line.me");
        assert_eq!(config.line.data_api_base, "https://api-data.line.me");
        assert_eq!(config.line.timeout_secs, 30);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn default_config_is_valid() {
        BotConfig::default().validate().unwrap();
    }

    #[test]
    fn analysis_params_follow_config() {
        let config = AnalysisConfig {
            resolution: 256,
            threshold: 90,
        };
        assert_eq!(
            config.params(),
            AnalysisParams {
                resolution: 256,
                threshold: 90
            }
        );
        assert_eq!(AnalysisConfig::default().params(), AnalysisParams::default());
    }

    #[test]
    fn parse_partial_config() {
        let config: BotConfig = toml::from_str("[analysis]\nthreshold = 100\n").unwrap();
        // Overridden value
        assert_eq!(config.analysis.threshold, 100);
        // Default values preserved
        assert_eq!(config.analysis.resolution, 512);
        assert_eq!(config.server.port, 10000);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<BotConfig, _> = toml::from_str("[analysis]\nthreshhold = 100\n");
        assert!(result.is_err());

        let result: Result<BotConfig, _> = toml::from_str("[webhook]\npath = \"/cb\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: BotConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, BotConfig::default());
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn validate_rejects_non_power_of_two_resolution() {
        let mut config = BotConfig::default();
        config.analysis.resolution = 500;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_tiny_resolution() {
        let mut config = BotConfig::default();
        config.analysis.resolution = 4;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.analysis.resolution = 8;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let mut config = BotConfig::default();
        config.analysis.threshold = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_non_http_api_base() {
        let mut config = BotConfig::default();
        config.line.api_base = "api.line.me".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("line.api_base"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = BotConfig::default();
        config.line.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // environment tests
    // =========================================================================

    #[test]
    fn port_env_overrides_config() {
        let mut config = BotConfig::default();
        config
            .apply_env_overrides(|key| (key == "PORT").then(|| "8080".to_string()))
            .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn absent_port_env_keeps_config() {
        let mut config = BotConfig::default();
        config.apply_env_overrides(|_| None).unwrap();
        assert_eq!(config.server.port, 10000);
    }

    #[test]
    fn invalid_port_env_is_validation_error() {
        let mut config = BotConfig::default();
        let err = config
            .apply_env_overrides(|_| Some("eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("eighty")));
    }

    #[test]
    fn secrets_from_lookup() {
        let secrets = Secrets::from_lookup(|key| match key {
            "LINE_CHANNEL_ACCESS_TOKEN" => Some("token".into()),
            "LINE_CHANNEL_SECRET" => Some("secret".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(secrets.channel_access_token, "token");
        assert_eq!(secrets.channel_secret, "secret");
    }

    #[test]
    fn secrets_missing_or_blank_is_error() {
        let err = Secrets::from_lookup(|key| {
            (key == "LINE_CHANNEL_ACCESS_TOKEN").then(|| "token".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("LINE_CHANNEL_SECRET")));

        let err = Secrets::from_lookup(|_| Some("  ".to_string())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingEnv("LINE_CHANNEL_ACCESS_TOKEN")
        ));
    }

    #[test]
    fn secrets_debug_is_redacted() {
        let secrets = Secrets {
            channel_access_token: "tok-123".into(),
            channel_secret: "sec-456".into(),
        };
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("tok-123"));
        assert!(!debug.contains("sec-456"));
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 10),
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        assert_eq!(
            effective_threads(&ProcessingConfig {
                max_processes: Some(0)
            }),
            1
        );
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, BotConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[server]
port = 9000

[analysis]
resolution = 256
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.analysis.resolution, 256);
        // Unspecified values should be defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.analysis.threshold, 127);
    }

    #[test]
    fn load_config_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[server\nport = ").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_validates_merged_result() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[analysis]\nresolution = 300\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n[b]\nz = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
        assert_eq!(merged["b"]["z"].as_integer(), Some(4));
    }
}
