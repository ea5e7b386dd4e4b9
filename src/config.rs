//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! the `LISTEN` environment variable, then command-line flags (see
//! [`crate::cli`]).
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//!   workers: 8
//!   queue_depth: 128
//!   overflow: reject
//!   read_timeout_secs: 10
//!   write_timeout_secs: 30
//! static_files:
//!   root: /srv/www
//! logging:
//!   level: debug
//!   file: /var/log/lantern.log
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::http::connection::Deadlines;
use crate::server::pool::OverflowPolicy;

/// Environment variable overriding the listen address (`host:port`).
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub logging: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Connections served concurrently.
    pub workers: usize,
    /// Accepted connections allowed to wait for a worker.
    pub queue_depth: usize,
    pub overflow: OverflowPolicy,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error.
    pub level: String,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            workers: 1,
            queue_depth: 64,
            overflow: OverflowPolicy::Block,
            read_timeout_secs: 30,
            write_timeout_secs: 30,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl ServerConfig {
    /// Address to bind, `host:port`. IPv6 literals are bracketed.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn deadlines(&self) -> Deadlines {
        Deadlines {
            read: Some(Duration::from_secs(self.read_timeout_secs)),
            write: Some(Duration::from_secs(self.write_timeout_secs)),
        }
    }

    /// Sets host and port from a `host:port` string.
    pub fn set_listen_addr(&mut self, addr: &str) -> anyhow::Result<()> {
        let (host, port) = addr
            .rsplit_once(':')
            .with_context(|| format!("listen address {addr:?} is missing a port"))?;
        let port = port
            .parse()
            .with_context(|| format!("invalid port in listen address {addr:?}"))?;

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            bail!("listen address {addr:?} is missing a host");
        }

        self.host = host.to_string();
        self.port = port;
        Ok(())
    }
}

impl Config {
    /// Defaults with environment overrides applied.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Reads a YAML file; missing sections and fields keep their defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(addr) = std::env::var(LISTEN_ENV) {
            self.server
                .set_listen_addr(&addr)
                .with_context(|| format!("invalid {LISTEN_ENV} value"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.server.queue_depth == 0 {
            bail!("queue_depth must be at least 1");
        }
        if self.server.read_timeout_secs == 0 || self.server.write_timeout_secs == 0 {
            bail!("timeouts must be at least one second");
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            bail!("unknown log level {:?}", self.logging.level);
        }
        Ok(())
    }
}
