use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use axum::http::HeaderValue;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://todo.db";
const DEFAULT_INDEX_FILE: &str = "static/index.html";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub index_file: PathBuf,
    /// Browser origin allowed to call the API with credentials, if any.
    pub cors_origin: Option<HeaderValue>,
    pub session_max_age: Duration,
}

impl Config {
    /// Loads `.env` (when present) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let bind_addr = parse_var("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 4000)))?;
        let index_file = env::var("INDEX_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_INDEX_FILE));
        let cors_origin = match env::var("CORS_ORIGIN") {
            Ok(value) if !value.is_empty() => Some(
                HeaderValue::from_str(&value).map_err(|_| ConfigError::Invalid {
                    key: "CORS_ORIGIN",
                    value,
                })?,
            ),
            _ => None,
        };
        let session_max_age = Duration::from_secs(parse_var(
            "SESSION_MAX_AGE_SECS",
            DEFAULT_SESSION_MAX_AGE_SECS,
        )?);

        Ok(Self {
            database_url,
            max_connections,
            bind_addr,
            index_file,
            cors_origin,
            session_max_age,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
