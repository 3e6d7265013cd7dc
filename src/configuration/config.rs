use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Args;
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime parameters of the telemetry client.
///
/// Loaded from a TOML file with [`Config::from_file`]; every field is optional
/// in the file and falls back to the value in [`Config::default`]. Command-line
/// arguments ([`CliArgs`]) are applied on top by [`Config::load`].
///
/// # Fields Overview
///
/// - `api_base_url`: base of the snapshot query interface (`/packets`, `/alerts`, `/stats`)
/// - `stream_url`: streaming endpoint, `ws://`, `wss://` or `tcp://host:port`
/// - `reconnect_delay_ms`: fixed delay between reconnection attempts
/// - `max_retries`: failed attempts tolerated before the connection is given up
/// - `buffer_capacity`: number of records kept per live table
/// - `highlight_ttl_ms`: how long a freshly pushed record is flagged as new
/// - `page_size`: number of records requested per snapshot page
/// - `request_timeout_secs`: HTTP timeout for snapshot requests
/// - `render_interval_secs`: refresh period of the terminal view
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_base_url: String,
    pub stream_url: String,
    pub reconnect_delay_ms: u64,
    pub max_retries: u32,
    pub buffer_capacity: usize,
    pub highlight_ttl_ms: u64,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub render_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: String::from("http://localhost:8080/api"),
            stream_url: String::from("ws://localhost:8080/ws"),
            reconnect_delay_ms: 3000,
            max_retries: 5,
            buffer_capacity: 20,
            highlight_ttl_ms: 2000,
            page_size: 20,
            request_timeout_secs: 10,
            render_interval_secs: 2,
        }
    }
}

/// Command-line overrides for [`Config`].
///
/// Flattened into the binary's argument parser. Each value, when present,
/// replaces the corresponding file value.
#[derive(Args, Debug, Clone, Default)]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(long = "config", env = "SONDE_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Base URL of the snapshot API, e.g. http://localhost:8080/api
    #[arg(long, env = "SONDE_API_URL")]
    pub api_base_url: Option<String>,

    /// Streaming endpoint, e.g. ws://localhost:8080/ws or tcp://host:port
    #[arg(long, env = "SONDE_STREAM_URL")]
    pub stream_url: Option<String>,

    /// Delay between reconnection attempts, in milliseconds
    #[arg(long)]
    pub reconnect_delay_ms: Option<u64>,

    /// Failed attempts tolerated before giving up
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Records kept per live table
    #[arg(long)]
    pub buffer_capacity: Option<usize>,

    /// Records requested per snapshot page
    #[arg(long)]
    pub page_size: Option<usize>,
}

impl Config {
    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        debug!("Configuration read from {}", path.display());
        Ok(config)
    }

    /// Builds the effective configuration: the file named by `args` (or the
    /// defaults), with every command-line override applied, then validated.
    pub fn load(args: &CliArgs) -> Result<Config, ConfigError> {
        let mut config = match &args.config_file {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Config::from_file(path)?
            }
            None => Config::default(),
        };
        config.apply(args);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, args: &CliArgs) {
        if let Some(url) = &args.api_base_url {
            self.api_base_url = url.clone();
        }
        if let Some(url) = &args.stream_url {
            self.stream_url = url.clone();
        }
        if let Some(delay) = args.reconnect_delay_ms {
            self.reconnect_delay_ms = delay;
        }
        if let Some(retries) = args.max_retries {
            self.max_retries = retries;
        }
        if let Some(capacity) = args.buffer_capacity {
            self.buffer_capacity = capacity;
        }
        if let Some(size) = args.page_size {
            self.page_size = size;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api_url(&self.api_base_url)?;
        StreamEndpoint::parse(&self.stream_url)?;

        let positive = [
            ("reconnect_delay_ms", self.reconnect_delay_ms),
            ("max_retries", u64::from(self.max_retries)),
            ("buffer_capacity", self.buffer_capacity as u64),
            ("page_size", self.page_size as u64),
            ("request_timeout_secs", self.request_timeout_secs),
            ("render_interval_secs", self.render_interval_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::NotInRange(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn stream_endpoint(&self) -> Result<StreamEndpoint, ConfigError> {
        StreamEndpoint::parse(&self.stream_url)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn highlight_ttl(&self) -> Duration {
        Duration::from_millis(self.highlight_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_secs(self.render_interval_secs)
    }
}
