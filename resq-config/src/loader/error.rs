use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ConfigGuardRailError;

/// Why configuration could not be assembled. Each variant names the file or
/// key at fault so startup can fail with an actionable message.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("config file {} does not exist", path.display())]
    MissingConfig { path: PathBuf },

    #[error("could not read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid resq TOML", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{key} = {value:?} rejected: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("configuration rejected: {0}")]
    GuardRail(#[from] ConfigGuardRailError),

    #[error("env file could not be applied: {0}")]
    EnvFile(#[from] dotenvy::Error),
}
