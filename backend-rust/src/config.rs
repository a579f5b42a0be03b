//! Typed configuration loaded from `config.yaml` (or `--config <path>`).
//!
//! Every field has a default; a missing or unparseable file is a warning,
//! not a fatal error — the server always starts with something runnable.

use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

fn default_tcp_url() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_workers() -> usize {
    5
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_sink_kind() -> String {
    "log".to_string()
}

fn default_timezone() -> String {
    "Asia/Jakarta".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TcpConfig {
    #[serde(default = "default_tcp_url")]
    pub url: String,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self { url: default_tcp_url() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_sink_kind")]
    pub kind: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self { kind: default_sink_kind(), timezone: default_timezone() }
    }
}

/// Recognized but unused by the core — matches the source's unused
/// DBConfig/RabbitMQConfig/RedisConfig (see DESIGN.md).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RabbitMqConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub db: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { directory: default_log_directory(), level: default_log_level() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tcp: TcpConfig,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub rabbitmq: RabbitMqConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tcp: TcpConfig::default(),
            workers: default_workers(),
            read_timeout_secs: default_read_timeout_secs(),
            sink: SinkConfig::default(),
            db: DbConfig::default(),
            rabbitmq: RabbitMqConfig::default(),
            redis: RedisConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Load config from `path`, falling back field-by-field (via a fresh
/// `Config::default()`) if the file is missing or fails to parse.
pub async fn load_config(path: &str) -> Config {
    if !std::path::Path::new(path).exists() {
        info!("no {path} found, using default configuration");
        return Config::default();
    }

    match fs::read_to_string(path).await {
        Ok(data) => match serde_yaml::from_str::<Config>(&data) {
            Ok(config) => {
                info!(
                    "loaded {path}: listening on {}, {} worker(s), sink={}",
                    config.tcp.url, config.workers, config.sink.kind
                );
                config
            }
            Err(e) => {
                warn!("failed to parse {path}: {e}, using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            warn!("failed to read {path}: {e}, using default configuration");
            Config::default()
        }
    }
}
