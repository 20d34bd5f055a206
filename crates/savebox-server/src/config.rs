use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Read `SAVEBOX_*` variables; `.env` should already be loaded.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("SAVEBOX_JWT_SECRET").unwrap_or_else(|| {
            warn!("SAVEBOX_JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.into()
        });
        let port = match lookup("SAVEBOX_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid SAVEBOX_PORT: {raw}"))?,
            None => 3000,
        };

        Ok(Self {
            jwt_secret,
            db_path: db_path_from(&lookup),
            host: lookup("SAVEBOX_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn db_path_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(lookup("SAVEBOX_DB_PATH").unwrap_or_else(|| "savebox.db".into()))
}
