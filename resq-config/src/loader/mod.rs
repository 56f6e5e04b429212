pub mod error;

use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

use crate::{
    models::{
        Config, ConfigMetadata, CorsConfig, FanoutConfig, ServerConfig,
        sources::{EnvConfig, FileConfig},
    },
    util::parse_duration,
    validation::{self, ConfigWarnings},
};
use error::ConfigLoadError;

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![PathBuf::from("resq.toml"), PathBuf::from("config/resq.toml")]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Apply `.env`, read the process environment and the config file, and
    /// compose the final configuration.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose from an already gathered environment. Does not read `.env`.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) = compose_config(file_config, env, config_path)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path)
        {
            (Some(explicit), _) => (Some(explicit.clone()), true),
            (None, Some(from_env)) => (Some(from_env.clone()), true),
            (None, None) => (
                DEFAULT_CONFIG_LOCATIONS
                    .iter()
                    .find(|candidate| candidate.exists())
                    .cloned(),
                false,
            ),
        };

        let Some(path) = path else {
            return Ok((None, None));
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        debug!(path = %path.display(), "configuration file loaded");
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No resq.toml detected; using environment variables and defaults",
            "Create resq.toml or set RESQ_CONFIG_PATH",
        );
    }

    let FileConfig {
        server: file_server,
        cors: file_cors,
        fanout: file_fanout,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let defaults = Config::default();

    let dev_mode = match env.dev_mode_flag() {
        Some(Ok(flag)) => flag,
        Some(Err(raw)) => {
            return Err(ConfigLoadError::InvalidValue {
                key: "DEV_MODE",
                value: raw,
                reason: "expected true/false, yes/no, on/off or 1/0".into(),
            });
        }
        None => file_dev_mode.unwrap_or(false),
    };

    let port = match env.server_port {
        Some(raw) => raw.trim().parse::<u16>().map_err(|err| {
            ConfigLoadError::InvalidValue {
                key: "SERVER_PORT",
                value: raw.clone(),
                reason: err.to_string(),
            }
        })?,
        None => file_server.port.unwrap_or(defaults.server.port),
    };

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or(defaults.server.host),
        port,
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file_cors.allowed_origins)
            .unwrap_or(defaults.cors.allowed_origins),
    };

    let watcher_buffer = match env.watcher_buffer {
        Some(raw) => raw.trim().parse::<usize>().map_err(|err| {
            ConfigLoadError::InvalidValue {
                key: "FANOUT_WATCHER_BUFFER",
                value: raw.clone(),
                reason: err.to_string(),
            }
        })?,
        None => file_fanout
            .watcher_buffer
            .unwrap_or(defaults.fanout.watcher_buffer),
    };

    let fanout = FanoutConfig {
        watcher_buffer,
        push_timeout: resolve_duration(
            "FANOUT_PUSH_TIMEOUT",
            env.push_timeout,
            "fanout.push_timeout",
            file_fanout.push_timeout,
            defaults.fanout.push_timeout,
        )?,
        keepalive_interval: resolve_duration(
            "FANOUT_KEEPALIVE_INTERVAL",
            env.keepalive_interval,
            "fanout.keepalive_interval",
            file_fanout.keepalive_interval,
            defaults.fanout.keepalive_interval,
        )?,
    };

    let config = Config {
        server,
        cors,
        fanout,
        dev_mode,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    };

    validation::enforce_guard_rails(&config)?;
    validation::collect_warnings(&config, &mut warnings);

    Ok((config, warnings))
}

fn resolve_duration(
    env_key: &'static str,
    env_value: Option<String>,
    file_key: &'static str,
    file_value: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    let (key, raw) = match (env_value, file_value) {
        (Some(raw), _) => (env_key, raw),
        (None, Some(raw)) => (file_key, raw),
        (None, None) => return Ok(default),
    };

    parse_duration(&raw).map_err(|err| ConfigLoadError::InvalidValue {
        key,
        value: raw,
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_file_and_file_overrides_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            dev_mode = true

            [server]
            host = "127.0.0.1"
            port = 9000

            [fanout]
            watcher_buffer = 16
            push_timeout = "2s"
            "#,
        )
        .unwrap();
        let env = EnvConfig {
            server_port: Some("9100".into()),
            keepalive_interval: Some("10s".into()),
            ..EnvConfig::default()
        };

        let (config, warnings) =
            compose_config(Some(file), env, Some(PathBuf::from("resq.toml"))).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.fanout.watcher_buffer, 16);
        assert_eq!(config.fanout.push_timeout, Duration::from_secs(2));
        assert_eq!(config.fanout.keepalive_interval, Duration::from_secs(10));
        assert!(config.dev_mode);
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_file_warns_and_uses_defaults() {
        let (config, warnings) =
            compose_config(None, EnvConfig::default(), None).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.fanout.watcher_buffer, 32);
        assert!(
            warnings
                .items
                .iter()
                .any(|w| w.message.contains("No resq.toml"))
        );
    }

    #[test]
    fn malformed_env_value_names_the_variable() {
        let env = EnvConfig {
            push_timeout: Some("eventually".into()),
            ..EnvConfig::default()
        };
        let err = compose_config(None, env, None).unwrap_err();
        match err {
            ConfigLoadError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "FANOUT_PUSH_TIMEOUT");
                assert_eq!(value, "eventually");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_buffer_hits_guard_rail() {
        let env = EnvConfig {
            watcher_buffer: Some("0".into()),
            ..EnvConfig::default()
        };
        let err = compose_config(None, env, None).unwrap_err();
        assert!(matches!(err, ConfigLoadError::GuardRail(_)));
    }

    #[test]
    fn dev_mode_must_be_a_boolean() {
        let env = EnvConfig {
            dev_mode: Some("sometimes".into()),
            ..EnvConfig::default()
        };
        let err = compose_config(None, env, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::InvalidValue { key: "DEV_MODE", .. }
        ));

        let env = EnvConfig {
            dev_mode: Some("ON".into()),
            ..EnvConfig::default()
        };
        let (config, _) = compose_config(None, env, None).unwrap();
        assert!(config.dev_mode);
    }

    #[test]
    fn absurd_keepalive_is_refused_at_load() {
        let env = EnvConfig {
            keepalive_interval: Some("100000000years".into()),
            ..EnvConfig::default()
        };
        let err = compose_config(None, env, None).unwrap_err();
        assert!(matches!(err, ConfigLoadError::GuardRail(_)));
    }
}
