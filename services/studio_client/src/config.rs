//! services/studio_client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::FixedOffset;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub state_dir: PathBuf,
    pub display_offset: FixedOffset,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend ---
        let api_url = lookup("STUDIO_API_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8000".to_string())
            .trim_end_matches('/')
            .to_string();
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "STUDIO_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_url),
            ));
        }

        let state_dir = lookup("STUDIO_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.studio"));

        // --- Display zone ---
        let offset_str = lookup("DISPLAY_UTC_OFFSET").unwrap_or_else(|| "+05:30".to_string());
        let display_offset = offset_str.parse::<FixedOffset>().map_err(|_| {
            ConfigError::InvalidValue(
                "DISPLAY_UTC_OFFSET".to_string(),
                format!("'{}' is not a ±HH:MM offset", offset_str),
            )
        })?;

        // --- Timing ---
        let poll_interval = positive_secs(&lookup, "POLL_INTERVAL_SECS", 10)?;
        let request_timeout = positive_secs(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_url,
            state_dir,
            display_offset,
            poll_interval,
            request_timeout,
            log_level,
        })
    }

    /// Joins an endpoint path onto the backend base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn positive_secs<F>(lookup: &F, name: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))?,
        None => default,
    };
    if secs == 0 {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.state_dir, PathBuf::from("./.studio"));
        assert_eq!(config.display_offset.local_minus_utc(), 19_800);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn overrides_and_trailing_slash() {
        let config = config_from(&[
            ("STUDIO_API_URL", "https://studio.example.com/"),
            ("DISPLAY_UTC_OFFSET", "-04:00"),
            ("POLL_INTERVAL_SECS", "3"),
            ("RUST_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://studio.example.com");
        assert_eq!(
            config.endpoint("/feature1/jobs"),
            "https://studio.example.com/feature1/jobs"
        );
        assert_eq!(config.display_offset.local_minus_utc(), -4 * 3600);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config_from(&[("DISPLAY_UTC_OFFSET", "IST")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "DISPLAY_UTC_OFFSET"
        ));
        assert!(matches!(
            config_from(&[("POLL_INTERVAL_SECS", "0")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "POLL_INTERVAL_SECS"
        ));
        assert!(matches!(
            config_from(&[("REQUEST_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "REQUEST_TIMEOUT_SECS"
        ));
        assert!(matches!(
            config_from(&[("STUDIO_API_URL", "ftp://nope")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "STUDIO_API_URL"
        ));
    }
}
