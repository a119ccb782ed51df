// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the portal REST API, e.g. `http://localhost:8000/api/user/teacher`.
    pub api_url: String,
    pub rust_log: String,
    pub request_timeout: Duration,
    /// How long the "updated successfully" notice stays visible.
    pub notice_ttl: Duration,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let api_url = env::var("API_URL").map_err(|_| ConfigError::Missing("API_URL"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let request_timeout = Duration::from_secs(seconds_var("REQUEST_TIMEOUT_SECS", 30)?);

        let notice_ttl = Duration::from_secs(seconds_var("NOTICE_TTL_SECS", 3)?);

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        Ok(Self {
            api_url,
            rust_log,
            request_timeout,
            notice_ttl,
            log_dir,
        })
    }
}

fn seconds_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_seconds(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_seconds(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
