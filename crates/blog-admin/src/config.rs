use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use blog_db::DbOptions;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub readers: usize,
    pub busy_timeout: Duration,
    /// Drop every table before migrating.
    pub reset: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("BLOG_DB_PATH").unwrap_or_else(|| "blog.db".into());

        let readers: usize = lookup("BLOG_DB_READERS")
            .unwrap_or_else(|| "4".into())
            .parse()
            .context("BLOG_DB_READERS must be a positive integer")?;
        if readers == 0 {
            bail!("BLOG_DB_READERS must be at least 1");
        }

        let busy_timeout_ms: u64 = lookup("BLOG_DB_BUSY_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("BLOG_DB_BUSY_TIMEOUT_MS must be milliseconds")?;

        let reset = match lookup("BLOG_DB_RESET").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => bail!("BLOG_DB_RESET must be 1/true or 0/false, got {:?}", other),
        };

        Ok(Self {
            db_path: PathBuf::from(db_path),
            readers,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            reset,
        })
    }

    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            readers: self.readers,
            busy_timeout: self.busy_timeout,
        }
    }
}
