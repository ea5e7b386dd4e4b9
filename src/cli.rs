use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::server::pool::OverflowPolicy;

/// Command-line flags. Every flag is optional and overrides the
/// corresponding config value when given.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "lantern", version, about = "Serve a directory over HTTP/1.1")]
pub struct Cli {
    /// YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short = 'a', long)]
    pub address: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Number of connections served concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Document root
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Log file (stderr when omitted)
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(short = 'e', long = "log-level")]
    pub log_level: Option<String>,

    /// Connections allowed to wait for a free worker
    #[arg(long)]
    pub queue_depth: Option<usize>,

    /// What to do with new connections when the queue is full
    #[arg(long, value_enum)]
    pub overflow: Option<OverflowPolicy>,

    /// Seconds to wait for each request line before giving up
    #[arg(long = "read-timeout")]
    pub read_timeout_secs: Option<u64>,

    /// Seconds allowed for writing the response
    #[arg(long = "write-timeout")]
    pub write_timeout_secs: Option<u64>,
}

impl Cli {
    /// Builds the effective configuration: file (if any), environment, then
    /// these flags.
    pub fn into_config(self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => {
                let mut cfg = Config::from_file(path)?;
                cfg.apply_env()?;
                cfg
            }
            None => Config::load()?,
        };
        self.apply(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply(self, cfg: &mut Config) {
        if let Some(host) = self.address {
            cfg.server.host = host;
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(workers) = self.workers {
            cfg.server.workers = workers;
        }
        if let Some(depth) = self.queue_depth {
            cfg.server.queue_depth = depth;
        }
        if let Some(policy) = self.overflow {
            cfg.server.overflow = policy;
        }
        if let Some(secs) = self.read_timeout_secs {
            cfg.server.read_timeout_secs = secs;
        }
        if let Some(secs) = self.write_timeout_secs {
            cfg.server.write_timeout_secs = secs;
        }
        if let Some(root) = self.root {
            cfg.static_files.root = root;
        }
        if let Some(file) = self.log {
            cfg.logging.file = Some(file);
        }
        if let Some(level) = self.log_level {
            cfg.logging.level = level;
        }
    }
}
