use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@realdeal.local";
/// 5 MB, the same limit the listing form checks client-side.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub admin_email: String,
    pub max_upload_bytes: usize,
    pub seed_demo: bool,
}

impl Config {
    /// Reads `REALDEAL_*` variables, falling back to development defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = var("REALDEAL_PORT", "3000")
            .parse()
            .context("REALDEAL_PORT must be a port number")?;
        let max_upload_bytes = match get("REALDEAL_MAX_UPLOAD_BYTES") {
            Some(v) => v.parse().context("REALDEAL_MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let seed_demo = matches!(
            get("REALDEAL_SEED_DEMO").as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("1" | "true" | "yes")
        );

        Ok(Self {
            host: var("REALDEAL_HOST", "0.0.0.0"),
            port,
            db_path: var("REALDEAL_DB_PATH", "realdeal.db").into(),
            upload_dir: var("REALDEAL_UPLOAD_DIR", "./public/uploads").into(),
            admin_email: var("REALDEAL_ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL),
            max_upload_bytes,
            seed_demo,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
