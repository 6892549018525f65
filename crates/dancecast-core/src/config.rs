//! Client configuration
//!
//! Defaults, then an optional TOML file, then environment overrides. The
//! binary applies command line flags last.

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Environment variable overriding the server origin
pub const ENV_SERVER: &str = "DANCECAST_SERVER";
/// Environment variable overriding the display name
pub const ENV_NAME: &str = "DANCECAST_NAME";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a file in `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Log files kept after cleanup
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            max_log_files: 5,
        }
    }
}

impl LogConfig {
    /// Parsed level, `INFO` when the configured value is not a level
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Create the log directory if file output is enabled
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        if self.file_output {
            std::fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Log file of this process
    pub fn current_log_path(&self) -> PathBuf {
        self.log_dir
            .join(format!("dancecast-{}.log", std::process::id()))
    }

    /// Remove the oldest log files beyond `max_log_files`. Returns how many were removed.
    pub fn cleanup_old_logs(&self) -> std::io::Result<usize> {
        if !self.log_dir.is_dir() {
            return Ok(0);
        }

        let mut logs = Vec::new();
        for entry in std::fs::read_dir(&self.log_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("dancecast-") && name.ends_with(".log") {
                let modified = entry.metadata()?.modified()?;
                logs.push((modified, entry.path()));
            }
        }

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }
        logs.sort_by(|a, b| b.0.cmp(&a.0));
        let mut removed = 0;
        for (_, path) in logs.into_iter().skip(self.max_log_files) {
            std::fs::remove_file(path)?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Settings shared by the receiver and the catalog commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin of the media server, e.g. `http://192.168.1.20:8000`
    pub server: String,
    /// Identity sent when registering with the channel
    pub display_name: String,
    /// Delay before reconnecting a closed channel
    pub reconnect_delay_ms: u64,
    /// Concurrent preview loads
    pub thumbnail_concurrency: usize,
    /// Time update cadence of the headless surface
    pub clock_tick_ms: u64,
    /// Logging
    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:8000".to_string(),
            display_name: "Dancecast Receiver".to_string(),
            reconnect_delay_ms: 3000,
            thumbnail_concurrency: crate::thumbnail::DEFAULT_CONCURRENCY,
            clock_tick_ms: 250,
            log: LogConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(ENV_SERVER).ok(),
            std::env::var(ENV_NAME).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Replace server and name when given
    pub fn apply_overrides(&mut self, server: Option<String>, name: Option<String>) {
        if let Some(server) = server.filter(|s| !s.is_empty()) {
            self.server = server;
        }
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.display_name = name;
        }
    }

    /// Check ranges and the server scheme
    pub fn validate(&self) -> Result<()> {
        if !(self.server.starts_with("http://") || self.server.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "server must be an http(s) origin, got '{}'",
                self.server
            )));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(CoreError::Config(
                "reconnect_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.thumbnail_concurrency == 0 {
            return Err(CoreError::Config(
                "thumbnail_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.clock_tick_ms == 0 {
            return Err(CoreError::Config(
                "clock_tick_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Server origin without a trailing slash
    pub fn origin(&self) -> &str {
        self.server.trim_end_matches('/')
    }
}
