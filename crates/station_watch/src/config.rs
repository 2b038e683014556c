//! Configuration management for station_watch.
//!
//! This module handles loading, validation, and conversion of the TOML
//! configuration file into the library's [`FeedConfig`].

use serde::{Deserialize, Serialize};
use station_feed::config::DEFAULT_STREAM_TARGET;
use station_feed::fetch::raw_file_url;
use station_feed::markers::DEFAULT_DECLARATION;
use station_feed::FeedConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::cli::CliArgs;

fn default_base_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_declaration() -> String {
    DEFAULT_DECLARATION.to_string()
}

fn default_reconnect_delay_secs() -> f64 {
    5.0
}

fn default_grace_period_ms() -> u64 {
    100
}

fn default_cancel_timeout_ms() -> u64 {
    2000
}

fn default_queue_capacity() -> usize {
    1024
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the station markers come from
    pub document: DocumentSettings,
    /// Live feed connection settings
    pub stream: StreamSettings,
    /// Optional dump of the marker table
    #[serde(default)]
    pub output: OutputSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Location of the JavaScript file declaring the markers.
///
/// By default the locator is composed from the GitHub coordinates;
/// `locator` replaces it entirely (any URL or a local path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub git_ref: String,
    /// Explicit locator overriding the fields above
    #[serde(default)]
    pub locator: Option<String>,
    /// Name of the `const` declaration holding the markers
    #[serde(default = "default_declaration")]
    pub declaration: String,
}

impl DocumentSettings {
    pub fn locator(&self) -> String {
        match &self.locator {
            Some(locator) => locator.clone(),
            None => raw_file_url(&self.base_url, &self.owner, &self.repo, &self.git_ref, &self.path),
        }
    }
}

impl StreamSettings {
    /// The backoff as a [`Duration`], rejecting values it cannot represent.
    pub fn reconnect_delay(&self) -> Result<Duration, String> {
        let delay = self.reconnect_delay_secs;
        Duration::try_from_secs_f64(delay).map_err(|e| format!("Invalid reconnect delay: {delay} ({e})"))
    }
}

/// WebSocket feed and reconnect pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// WebSocket URI (ws:// or wss://)
    pub uri: String,
    /// Backoff between connection attempts, in seconds
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: f64,
    /// Drain time given to the consumer after a disconnect, in milliseconds
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    /// How long a cancelled consumer may run on before it is aborted, in milliseconds
    #[serde(default = "default_cancel_timeout_ms")]
    pub cancel_timeout_ms: u64,
    /// Frame queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// File to write the startup marker table to
    pub path: Option<String>,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            document: DocumentSettings {
                base_url: default_base_url(),
                owner: "dovedalerailway".to_string(),
                repo: "dovedale-map".to_string(),
                path: "public/index.js".to_string(),
                git_ref: "main".to_string(),
                locator: None,
                declaration: default_declaration(),
            },
            stream: StreamSettings {
                uri: DEFAULT_STREAM_TARGET.to_string(),
                reconnect_delay_secs: default_reconnect_delay_secs(),
                grace_period_ms: default_grace_period_ms(),
                cancel_timeout_ms: default_cancel_timeout_ms(),
                queue_capacity: default_queue_capacity(),
            },
            output: OutputSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Applies command-line overrides on top of the file values.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(uri) = &args.stream_uri {
            self.stream.uri = uri.clone();
        }
        if let Some(document) = &args.document {
            self.document.locator = Some(document.clone());
        }
        if let Some(output) = &args.output {
            self.output.path = Some(output.to_string_lossy().to_string());
        }
        if let Some(delay) = args.reconnect_delay {
            self.stream.reconnect_delay_secs = delay;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.json_format = true;
        }
    }

    /// Converts to the library configuration.
    ///
    /// # Returns
    ///
    /// The [`FeedConfig`] for the supervisor, or an error if the reconnect
    /// delay is negative, not finite, or too large for a [`Duration`].
    pub fn to_feed_config(&self) -> Result<FeedConfig, String> {
        Ok(FeedConfig {
            document_locator: self.document.locator(),
            declaration: self.document.declaration.clone(),
            stream_target: self.stream.uri.clone(),
            reconnect_delay: self.stream.reconnect_delay()?,
            grace_period: Duration::from_millis(self.stream.grace_period_ms),
            cancel_timeout: Duration::from_millis(self.stream.cancel_timeout_ms),
            queue_capacity: self.stream.queue_capacity,
            output_path: self.output.path.as_ref().map(PathBuf::from),
        })
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        let uri = self.stream.uri.to_ascii_lowercase();
        if !(uri.starts_with("ws://") || uri.starts_with("wss://")) {
            return Err(format!(
                "Invalid stream URI: {} (expected ws:// or wss://)",
                self.stream.uri
            ));
        }

        self.stream.reconnect_delay()?;

        if self.stream.queue_capacity == 0 {
            return Err("Queue capacity must be at least 1".to_string());
        }

        if self.document.declaration.trim().is_empty() {
            return Err("Marker declaration name cannot be empty".to_string());
        }

        if self.document.locator().trim().is_empty() {
            return Err("Document locator cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.document.locator(),
            "https://raw.githubusercontent.com/dovedalerailway/dovedale-map/main/public/index.js"
        );
        assert_eq!(config.document.declaration, "AREA_MARKERS");
        assert_eq!(config.stream.uri, "wss://map.dovedale.wiki/ws");
        assert_eq!(config.stream.reconnect_delay_secs, 5.0);
        assert!(config.output.path.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_to_feed_config() {
        let mut config = AppConfig::default();
        config.output.path = Some("markers.json".to_string());
        config.stream.reconnect_delay_secs = 0.5;

        let feed = config.to_feed_config().unwrap();
        assert_eq!(feed.document_locator, config.document.locator());
        assert_eq!(feed.reconnect_delay, Duration::from_millis(500));
        assert_eq!(feed.grace_period, Duration::from_millis(100));
        assert_eq!(feed.cancel_timeout, Duration::from_secs(2));
        assert_eq!(feed.queue_capacity, 1024);
        assert_eq!(feed.output_path, Some(PathBuf::from("markers.json")));
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.stream.uri = "http://map.dovedale.wiki/ws".to_string();
        assert!(config.validate().is_err());

        config.stream.uri = "ws://127.0.0.1:9000".to_string();
        config.stream.reconnect_delay_secs = -1.0;
        assert!(config.validate().is_err());

        config.stream.reconnect_delay_secs = f64::NAN;
        assert!(config.validate().is_err());

        config.stream.reconnect_delay_secs = 0.0;
        config.stream.queue_capacity = 0;
        assert!(config.validate().is_err());

        config.stream.queue_capacity = 1;
        config.document.declaration = " ".to_string();
        assert!(config.validate().is_err());

        config.document.declaration = "MARKERS".to_string();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "warn".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_reconnect_delay_is_rejected() {
        let mut config = AppConfig::default();
        config.stream.reconnect_delay_secs = 1e30;
        assert!(config.validate().is_err());
        assert!(config.to_feed_config().is_err());

        config.stream.reconnect_delay_secs = f64::INFINITY;
        assert!(config.validate().is_err());

        config.stream.reconnect_delay_secs = 86_400.0;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.to_feed_config().unwrap().reconnect_delay,
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "station_watch",
            "--stream",
            "ws://localhost:1234/ws",
            "--document",
            "/tmp/index.js",
            "--output",
            "out.json",
            "--reconnect-delay",
            "1",
            "--json-logs",
        ]);
        config.apply_cli(&args);

        assert_eq!(config.stream.uri, "ws://localhost:1234/ws");
        assert_eq!(config.document.locator(), "/tmp/index.js");
        assert_eq!(config.output.path.as_deref(), Some("out.json"));
        assert_eq!(config.stream.reconnect_delay_secs, 1.0);
        assert!(config.logging.json_format);
        assert_eq!(config.logging.level, "info");
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("station_watch.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.stream.uri, DEFAULT_STREAM_TARGET);

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.document.locator(), config.document.locator());
    }

    #[tokio::test]
    async fn test_load_partial_file_uses_field_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        let content = r#"
[document]
owner = "someone"
repo = "some-map"
path = "src/markers.js"
git_ref = "dev"

[stream]
uri = "ws://127.0.0.1:9000/ws"

[logging]
level = "debug"
json_format = true
"#;
        file.write_all(content.as_bytes()).unwrap();

        let config = AppConfig::load_from_file(file.path()).await.unwrap();
        assert_eq!(
            config.document.locator(),
            "https://raw.githubusercontent.com/someone/some-map/dev/src/markers.js"
        );
        assert_eq!(config.document.declaration, "AREA_MARKERS");
        assert_eq!(config.stream.reconnect_delay_secs, 5.0);
        assert_eq!(config.stream.grace_period_ms, 100);
        assert_eq!(config.stream.cancel_timeout_ms, 2000);
        assert_eq!(config.stream.queue_capacity, 1024);
        assert!(config.output.path.is_none());
        assert!(config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[stream\nuri = ").unwrap();
        assert!(AppConfig::load_from_file(file.path()).await.is_err());
    }
}
