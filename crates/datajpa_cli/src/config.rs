use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use datajpa_core::db::IN_MEMORY_LOCATION;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// SQLite file path, or `:memory:`.
    pub db_path: String,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` logs to stderr.
    pub log_dir: Option<String>,
    pub seed_members: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str, default: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_addr = value("DATAJPA_BIND_ADDR", "127.0.0.1:8080")
            .parse::<SocketAddr>()
            .context("DATAJPA_BIND_ADDR must be a valid host:port")?;

        let db_path = value("DATAJPA_DB_PATH", IN_MEMORY_LOCATION);
        let log_level = value("DATAJPA_LOG_LEVEL", datajpa_core::default_log_level());

        let log_dir = lookup("DATAJPA_LOG_DIR")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());
        if let Some(dir) = &log_dir {
            if !std::path::Path::new(dir).is_absolute() {
                bail!("DATAJPA_LOG_DIR must be an absolute path, got `{dir}`");
            }
        }

        let seed_members = value("DATAJPA_SEED_MEMBERS", "100")
            .parse::<u32>()
            .context("DATAJPA_SEED_MEMBERS must be u32")?;

        Ok(Self {
            bind_addr,
            db_path,
            log_level,
            log_dir,
            seed_members,
        })
    }
}
