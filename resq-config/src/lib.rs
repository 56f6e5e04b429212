//! Configuration library for the ResQ status server.
//!
//! Values are layered: built-in defaults, then an optional `resq.toml`, then
//! the process environment (after `.env` has been applied). The loader also
//! reports soft problems as [`ConfigWarnings`] and refuses values that would
//! break the fanout engine.

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{
    Config, ConfigMetadata, CorsConfig, FanoutConfig, MAX_FANOUT_INTERVAL,
    ServerConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
