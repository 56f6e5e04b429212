use thiserror::Error;

use std::time::Duration;

use crate::models::{Config, MAX_FANOUT_INTERVAL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(
        &mut self,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Values the server refuses to start with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("fanout.watcher_buffer must be at least 1")]
    ZeroWatcherBuffer,
    #[error("fanout.push_timeout must be greater than zero")]
    ZeroPushTimeout,
    #[error("fanout.keepalive_interval must be greater than zero")]
    ZeroKeepaliveInterval,
    #[error("{key} of {value:?} exceeds the maximum of {max:?}")]
    IntervalTooLong {
        key: &'static str,
        value: Duration,
        max: Duration,
    },
}

pub fn enforce_guard_rails(config: &Config) -> Result<(), ConfigGuardRailError> {
    if config.fanout.watcher_buffer == 0 {
        return Err(ConfigGuardRailError::ZeroWatcherBuffer);
    }
    if config.fanout.push_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroPushTimeout);
    }
    if config.fanout.keepalive_interval.is_zero() {
        return Err(ConfigGuardRailError::ZeroKeepaliveInterval);
    }
    for (key, value) in [
        ("fanout.push_timeout", config.fanout.push_timeout),
        ("fanout.keepalive_interval", config.fanout.keepalive_interval),
    ] {
        if value > MAX_FANOUT_INTERVAL {
            return Err(ConfigGuardRailError::IntervalTooLong {
                key,
                value,
                max: MAX_FANOUT_INTERVAL,
            });
        }
    }
    Ok(())
}

pub fn collect_warnings(config: &Config, warnings: &mut ConfigWarnings) {
    if config.cors.is_wildcard_included() && !config.dev_mode {
        warnings.push_with_hint(
            "CORS allows any origin",
            "Set CORS_ALLOWED_ORIGINS to the report form's origin",
        );
    }

    if config.fanout.watcher_buffer == 1 {
        warnings.push_with_hint(
            "fanout.watcher_buffer is 1; a watcher is dropped as soon as two updates queue up",
            "Use a buffer of at least 8 unless you want aggressive eviction",
        );
    }

    if config.fanout.push_timeout > config.fanout.keepalive_interval {
        warnings.push(
            "fanout.push_timeout exceeds keepalive_interval; stalled sockets are detected late",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_guard_rails() {
        assert_eq!(enforce_guard_rails(&Config::default()), Ok(()));
    }

    #[test]
    fn zero_buffer_is_refused() {
        let mut config = Config::default();
        config.fanout.watcher_buffer = 0;
        assert_eq!(
            enforce_guard_rails(&config),
            Err(ConfigGuardRailError::ZeroWatcherBuffer)
        );
    }

    #[test]
    fn wildcard_cors_warns_outside_dev_mode() {
        let mut warnings = ConfigWarnings::default();
        collect_warnings(&Config::default(), &mut warnings);
        assert_eq!(warnings.len(), 1);

        let mut dev = Config::default();
        dev.dev_mode = true;
        let mut warnings = ConfigWarnings::default();
        collect_warnings(&dev, &mut warnings);
        assert!(warnings.is_empty());
    }

    #[test]
    fn slow_push_timeout_warns() {
        let mut config = Config::default();
        config.dev_mode = true;
        config.fanout.push_timeout = Duration::from_secs(60);
        let mut warnings = ConfigWarnings::default();
        collect_warnings(&config, &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert!(warnings.items[0].hint.is_none());
    }

    #[test]
    fn oversized_intervals_are_refused() {
        let mut config = Config::default();
        config.fanout.keepalive_interval = Duration::from_secs(400 * 24 * 60 * 60);
        assert!(matches!(
            enforce_guard_rails(&config),
            Err(ConfigGuardRailError::IntervalTooLong {
                key: "fanout.keepalive_interval",
                ..
            })
        ));

        config.fanout.keepalive_interval = MAX_FANOUT_INTERVAL;
        assert_eq!(enforce_guard_rails(&config), Ok(()));
    }
}
