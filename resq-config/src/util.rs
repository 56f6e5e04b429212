use std::time::Duration;

/// Read an environment variable, treating blank values as unset.
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Comma separated list; empty segments are skipped.
pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}

const TRUTHY: &[&str] = &["1", "true", "yes", "on"];
const FALSY: &[&str] = &["0", "false", "no", "off"];

/// `DEV_MODE=yes`, `DEV_MODE=0` and friends. Anything else is `None`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    let matches = |forms: &[&str]| forms.iter().any(|f| f.eq_ignore_ascii_case(raw));
    if matches(TRUTHY) {
        Some(true)
    } else if matches(FALSY) {
        Some(false)
    } else {
        None
    }
}

/// Durations use humantime syntax (`"250ms"`, `"5s"`, `"1m 30s"`).
pub fn parse_duration(raw: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(raw.trim())
}
