//! Application configuration loaded from environment variables.

use serde::Deserialize;
use strum::{Display, EnumString};
use url::Url;

/// Where the case tables come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SourceKind {
    /// Download over HTTP from `DATA_BASE_URL`.
    #[default]
    Remote,
    /// Read from `DATA_DIR`.
    Directory,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow cross-origin GET requests from any origin.
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,

    // === Data Source ===
    /// `remote` or `directory`.
    #[serde(default)]
    pub data_source: SourceKind,

    /// Base URL of the time-series CSV files (must end with `/`).
    #[serde(default = "default_base_url")]
    pub data_base_url: String,

    /// Directory holding the CSV files for the directory source.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Remote fetch timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Observability ===
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// `pretty` or `json`.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

/// JHU CSSE global time-series directory.
pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allow_any: true,
            data_source: SourceKind::default(),
            data_base_url: default_base_url(),
            data_dir: None,
            http_timeout_ms: default_http_timeout_ms(),
            metrics_enabled: true,
            log_format: LogFormat::default(),
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        match self.data_source {
            SourceKind::Remote => {
                let url = Url::parse(&self.data_base_url)
                    .map_err(|e| format!("DATA_BASE_URL is not a valid url: {e}"))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err("DATA_BASE_URL must use http or https".to_string());
                }
                if !url.path().ends_with('/') {
                    return Err("DATA_BASE_URL must end with '/'".to_string());
                }
            }
            SourceKind::Directory => {
                if self.data_dir.as_deref().map_or(true, str::is_empty) {
                    return Err("DATA_DIR is required when DATA_SOURCE=directory".to_string());
                }
            }
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.host.is_empty() {
            return Err("HOST must not be empty".to_string());
        }

        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tracing filter directive built from `RUST_LOG`. `verbose` raises this
    /// crate to debug on top of it.
    pub fn log_directive(&self, verbose: bool) -> String {
        if verbose {
            format!("{},covid19_api=debug", self.rust_log)
        } else {
            self.rust_log.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.data_source, SourceKind::Remote);
        assert!(config.data_base_url.ends_with('/'));
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn validate_rejects_directory_source_without_dir() {
        let config = Config {
            data_source: SourceKind::Directory,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            data_source: SourceKind::Directory,
            data_dir: Some("/var/lib/covid".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let config = Config {
            data_base_url: "ftp://example.com/data/".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            data_base_url: "https://example.com/data".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = Config {
            http_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn envy_reads_overrides() {
        let vars = vec![
            ("PORT".to_string(), "9000".to_string()),
            ("DATA_SOURCE".to_string(), "directory".to_string()),
            ("DATA_DIR".to_string(), "/data".to_string()),
            ("LOG_FORMAT".to_string(), "json".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_source, SourceKind::Directory);
        assert_eq!(config.data_dir.as_deref(), Some("/data"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn log_directive_follows_rust_log() {
        let config = Config {
            rust_log: "warn,tower_http=debug".to_string(),
            ..Config::default()
        };
        assert_eq!(config.log_directive(false), "warn,tower_http=debug");
        assert_eq!(
            config.log_directive(true),
            "warn,tower_http=debug,covid19_api=debug"
        );

        let vars = vec![("RUST_LOG".to_string(), "error".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.log_directive(false), "error");
    }
}
