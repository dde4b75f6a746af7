//! Database configuration.
//!
//! Loaded either from the environment (with `.env` support) or from a TOML file:
//!
//! ```toml
//! database_url = "postgres://${PGUSER}@localhost/jobly"
//! max_pool_size = 8
//! run_migrations = true
//! ```

use crate::error::{JoblyError, JoblyResult};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_POOL_SIZE: usize = 16;

/// Connection settings for the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbConfig {
    pub database_url: String,
    #[serde(default = "default_pool_size")]
    pub max_pool_size: usize,
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_pool_size: DEFAULT_POOL_SIZE,
            run_migrations: false,
        }
    }

    /// Read `DATABASE_URL`, `JOBLY_POOL_SIZE` and `JOBLY_RUN_MIGRATIONS`, loading `.env` first.
    pub fn from_env() -> JoblyResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> JoblyResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| JoblyError::Config("DATABASE_URL must be set".to_string()))?;

        let max_pool_size = match lookup("JOBLY_POOL_SIZE") {
            Some(raw) => raw.parse().map_err(|e| {
                JoblyError::Config(format!("JOBLY_POOL_SIZE: invalid value {raw:?}: {e}"))
            })?,
            None => DEFAULT_POOL_SIZE,
        };

        let run_migrations = match lookup("JOBLY_RUN_MIGRATIONS").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(JoblyError::Config(format!(
                    "JOBLY_RUN_MIGRATIONS: expected true/false, got {other:?}"
                )));
            }
        };

        let config = Self {
            database_url,
            max_pool_size,
            run_migrations,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> JoblyResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            JoblyError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML, expanding `${VAR}` references in `database_url`.
    pub fn from_toml_str(raw: &str) -> JoblyResult<Self> {
        let mut config: DbConfig = toml::from_str(raw)
            .map_err(|e| JoblyError::Config(format!("failed to parse config: {e}")))?;
        config.database_url = expand_env(&config.database_url, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> JoblyResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(JoblyError::Config("database_url is empty".to_string()));
        }
        if self.max_pool_size == 0 {
            return Err(JoblyError::Config(
                "max_pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn expand_env(input: &str, lookup: impl Fn(&str) -> Option<String>) -> JoblyResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| JoblyError::Config(format!("unterminated ${{...}} in {input:?}")))?;
        let key = &after[..end];
        let value = lookup(key)
            .ok_or_else(|| JoblyError::Config(format!("environment variable {key} is not set")))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
