//! `Settings`: everything the server needs at startup.

use crate::config::{validate_base_path, validate_identifier};
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/entities";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_BASE_PATH: &str = "/api/entities";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Which [`DataContext`](crate::context::DataContext) backs the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataContextKind {
    Postgres,
    Memory,
}

impl FromStr for DataContextKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DataContextKind::Postgres),
            "memory" | "in-memory" | "inmemory" => Ok(DataContextKind::Memory),
            other => Err(ConfigError::UnknownDataContext(other.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Schema holding the `entities` table. From `ENTITY_SCHEMA`, default `public`.
    pub schema: String,
    pub base_path: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub data_context: DataContextKind,
    pub body_limit_bytes: usize,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let schema = get("ENTITY_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        validate_identifier("ENTITY_SCHEMA", &schema)?;
        let base_path = get("ENTITY_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.into());
        validate_base_path("ENTITY_BASE_PATH", &base_path)?;

        let bind_addr: SocketAddr = parse_or("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;
        let max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), Some(DEFAULT_MAX_CONNECTIONS))?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }
        let body_limit_bytes = parse_or("BODY_LIMIT_BYTES", get("BODY_LIMIT_BYTES"), Some(DEFAULT_BODY_LIMIT_BYTES))?;
        let data_context = match get("DATA_CONTEXT") {
            Some(v) => v.parse()?,
            None => DataContextKind::Postgres,
        };

        Ok(Settings {
            database_url,
            schema,
            base_path,
            bind_addr,
            max_connections,
            data_context,
            body_limit_bytes,
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("'{}': {}", v, e),
        }),
        None => default.ok_or_else(|| ConfigError::Invalid {
            key,
            reason: "no default".into(),
        }),
    }
}
