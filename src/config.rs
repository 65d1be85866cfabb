//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.latencyscope.toml` files.

use crate::models::DEFAULT_THRESHOLD_MS;
use crate::store::DEFAULT_CANDIDATES;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".latencyscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Telemetry data settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Telemetry data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Data files to try, in order. The first one that exists is loaded.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
        }
    }
}

fn default_candidates() -> Vec<String> {
    DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Breach threshold used when a request does not specify one.
    #[serde(default = "default_threshold")]
    pub default_threshold_ms: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_threshold_ms: default_threshold(),
        }
    }
}

fn default_threshold() -> i64 {
    DEFAULT_THRESHOLD_MS
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually supplied override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(threshold) = args.threshold {
            self.analysis.default_threshold_ms = threshold;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.analysis.default_threshold_ms, 180);
        assert_eq!(config.data.candidates[0], "q-vercel-latency.json");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
host = "0.0.0.0"
port = 9100

[data]
candidates = ["/srv/telemetry.json"]

[analysis]
default_threshold_ms = 200
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.data.candidates, vec!["/srv/telemetry.json"]);
        assert_eq!(config.analysis.default_threshold_ms, 200);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.analysis.default_threshold_ms, 180);
        assert_eq!(config.data.candidates.len(), DEFAULT_CANDIDATES.len());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        config.merge_with_args(&args);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.analysis.default_threshold_ms, 180);

        args.host = Some("0.0.0.0".to_string());
        args.port = Some(3000);
        args.threshold = Some(250);
        config.merge_with_args(&args);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.analysis.default_threshold_ms, 250);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[analysis]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.server.port, 8000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[analysis]\ndefault_threshold_ms = 90\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.analysis.default_threshold_ms, 90);

        std::fs::write(&path, "[analysis\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
