use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub names_file: PathBuf,
    pub seed_users: usize,
}

impl Config {
    /// Reads `MICROBLOG_*` variables, falling back to defaults. Values that
    /// are present but malformed are an error.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = var("MICROBLOG_PORT", "5000");
        let seed_users = var("MICROBLOG_SEED_USERS", "10");

        Ok(Self {
            db_path: var("MICROBLOG_DB_PATH", "microblog.db").into(),
            host: var("MICROBLOG_HOST", "0.0.0.0"),
            port: port
                .parse()
                .with_context(|| format!("MICROBLOG_PORT is not a valid port: {port}"))?,
            names_file: var("MICROBLOG_NAMES_FILE", "name_list.txt").into(),
            seed_users: seed_users
                .parse()
                .with_context(|| format!("MICROBLOG_SEED_USERS is not a number: {seed_users}"))?,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
