//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::content::ReadLimits;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Directory of YAML content type and component definitions (default: ./schema).
    pub schema_dir: PathBuf,

    /// Page size used when only `page` is requested (default: 25).
    pub default_page_size: u32,

    /// Upper bound for `pageSize` (default: 100).
    pub max_page_size: u32,

    /// Deepest populate path accepted, in segments (default: 5).
    pub max_populate_depth: usize,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Per-request timeout in seconds (default: 30).
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = parse_var("PORT", 3000)?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 10)?;

        let schema_dir = env::var("SCHEMA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./schema"));

        let default_page_size = parse_var("DEFAULT_PAGE_SIZE", 25)?;
        let max_page_size = parse_var("MAX_PAGE_SIZE", 100)?;
        let max_populate_depth = parse_var("MAX_POPULATE_DEPTH", 5)?;

        if default_page_size == 0 || default_page_size > max_page_size {
            anyhow::bail!(
                "DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE ({max_page_size})"
            );
        }

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            schema_dir,
            default_page_size,
            max_page_size,
            max_populate_depth,
            cors_allowed_origins,
            request_timeout_secs,
        })
    }

    /// Limits applied to read requests.
    pub fn read_limits(&self) -> ReadLimits {
        ReadLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            max_populate_depth: self.max_populate_depth,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
