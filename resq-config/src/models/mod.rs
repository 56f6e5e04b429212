pub mod sources;

use std::{path::PathBuf, time::Duration};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_WATCHER_BUFFER: usize = 32;
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);
/// Upper bound for `push_timeout` and `keepalive_interval`.
pub const MAX_FANOUT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub fanout: FanoutConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*")
    }
}

/// Tuning for status delivery to watchers.
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Pushes queued per watcher before it counts as stalled and is dropped.
    pub watcher_buffer: usize,
    /// Upper bound on one socket write to a watcher.
    pub push_timeout: Duration,
    /// SSE keepalive comment / WebSocket ping interval.
    pub keepalive_interval: Duration,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            watcher_buffer: DEFAULT_WATCHER_BUFFER,
            push_timeout: DEFAULT_PUSH_TIMEOUT,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
