use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::DEFAULT_BASE_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
///
/// CLI flags may override individual fields after loading; see
/// [`crate::cli::Cli::apply_to`].
#[derive(Debug, Clone)]
pub struct Config {
    // Site
    pub base_url: String,

    // Fetching
    pub max_concurrent_requests: usize,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_initial_delay: Duration,

    // Output
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a set environment variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Site
            base_url: env_or_default("SOZLUK_BASE_URL", DEFAULT_BASE_URL),

            // Fetching
            max_concurrent_requests: parse_env_usize("MAX_CONCURRENT_REQUESTS", 15)?,
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 30)?),
            max_retries: parse_env_u32("MAX_RETRIES", 7)?,
            retry_initial_delay: Duration::from_millis(parse_env_u64(
                "RETRY_INITIAL_DELAY_MS",
                500,
            )?),

            // Output
            output_dir: PathBuf::from(env_or_default("OUTPUT_DIR", ".")),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_CONCURRENT_REQUESTS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "SOZLUK_BASE_URL".to_string(),
                message: format!("not an absolute URL: '{}'", self.base_url),
            });
        }
        Ok(())
    }

    /// Configuration for tests: no environment coupling, short timeouts,
    /// no retries unless a test opts in.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            base_url: "http://127.0.0.1".to_string(),
            max_concurrent_requests: 4,
            request_timeout: Duration::from_secs(5),
            max_retries: 0,
            retry_initial_delay: Duration::from_millis(10),
            output_dir: PathBuf::from("."),
        }
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
