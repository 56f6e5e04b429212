use serde::Deserialize;
use std::path::PathBuf;

use crate::util::{env_value, parse_bool, parse_csv};

/// Contents of `resq.toml`. Every key is optional.
///
/// ```toml
/// dev_mode = false
///
/// [server]
/// port = 8000
///
/// [fanout]
/// watcher_buffer = 32
/// push_timeout = "5s"
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: FileServerConfig,
    pub cors: FileCorsConfig,
    pub fanout: FileFanoutConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileCorsConfig {
    pub allowed_origins: Option<Vec<String>>,
}

/// Durations are humantime strings, e.g. `push_timeout = "5s"`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileFanoutConfig {
    pub watcher_buffer: Option<usize>,
    pub push_timeout: Option<String>,
    pub keepalive_interval: Option<String>,
}

/// Environment-derived configuration values.
///
/// Numeric and duration values are kept raw so the loader can report which
/// variable was malformed instead of silently ignoring it.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<String>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub watcher_buffer: Option<String>,
    pub push_timeout: Option<String>,
    pub keepalive_interval: Option<String>,
    pub dev_mode: Option<String>,
}

impl EnvConfig {
    /// Snapshot the process environment.
    pub fn gather() -> Self {
        Self {
            config_path: env_value("RESQ_CONFIG_PATH").map(PathBuf::from),
            server_host: env_value("SERVER_HOST"),
            server_port: env_value("SERVER_PORT"),
            cors_allowed_origins: env_value("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_csv(&raw)),
            watcher_buffer: env_value("FANOUT_WATCHER_BUFFER"),
            push_timeout: env_value("FANOUT_PUSH_TIMEOUT"),
            keepalive_interval: env_value("FANOUT_KEEPALIVE_INTERVAL"),
            dev_mode: env_value("DEV_MODE"),
        }
    }

    pub(crate) fn dev_mode_flag(&self) -> Option<Result<bool, String>> {
        self.dev_mode
            .as_ref()
            .map(|raw| parse_bool(raw).ok_or_else(|| raw.clone()))
    }
}
