use std::net::SocketAddr;

use thiserror::Error;

use crate::commands::{GroupingPolicy, SetOrdering};

const DEFAULT_DATABASE: &str = "trades.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;

#[derive(Error, Debug, PartialEq)]
#[error("Invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub database_path: String,
    pub grouping: GroupingPolicy,
    pub ordering: SetOrdering,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset keys fall back
    /// to defaults, malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError {
                var: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let addr: SocketAddr = format!("{}:{}", host, port).parse().map_err(|_| ConfigError {
            var: "HOST",
            value: host.clone(),
            reason: "not an IP address".to_string(),
        })?;

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let database_path = sqlite_path(&database_url)?;

        let grouping = parse_or_default(&lookup, "GROUPING_POLICY")?;
        let ordering = parse_or_default(&lookup, "SET_ORDERING")?;

        Ok(AppConfig {
            addr,
            database_path,
            grouping,
            ordering,
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, var: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr<Err = String> + Default,
{
    match lookup(var) {
        Some(raw) => raw.parse().map_err(|reason| ConfigError {
            var,
            value: raw,
            reason,
        }),
        None => Ok(T::default()),
    }
}

/// Accepts a bare path or a `sqlite://` URL. `sqlite:///trades.db` is the
/// relative file `trades.db`, `sqlite:////var/db/trades.db` is absolute.
fn sqlite_path(database_url: &str) -> Result<String, ConfigError> {
    let url = database_url.trim();
    let path = if let Some(rest) = url.strip_prefix("sqlite:///") {
        rest
    } else if let Some(rest) = url.strip_prefix("sqlite://") {
        rest
    } else if url.contains("://") {
        return Err(ConfigError {
            var: "DATABASE_URL",
            value: database_url.to_string(),
            reason: "only sqlite databases are supported".to_string(),
        });
    } else {
        url
    };

    if path.is_empty() {
        return Err(ConfigError {
            var: "DATABASE_URL",
            value: database_url.to_string(),
            reason: "missing database path".to_string(),
        });
    }

    Ok(path.to_string())
}
