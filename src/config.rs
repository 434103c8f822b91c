use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_DB_PATH: &str = "tickets.sqlite";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db_path: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.into());
        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {v}"))?,
            None => 5,
        };
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port_var = lookup("APP_PORT")
            .map(|v| ("APP_PORT", v))
            .or_else(|| lookup("PORT").map(|v| ("PORT", v)));
        let port = match port_var {
            Some((key, v)) => v
                .parse::<u16>()
                .with_context(|| format!("{key} is not a valid port: {v}"))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            db_path,
            db_max_connections,
            host,
            port,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
