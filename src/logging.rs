use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, anyhow};
use tracing::Level;

use crate::config::LogConfig;

/// Installs the global subscriber. Called once at startup.
pub fn init(cfg: &LogConfig) -> anyhow::Result<()> {
    let level: Level = cfg
        .level
        .parse()
        .map_err(|_| anyhow!("unknown log level {:?}", cfg.level))?;

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level);

    let installed = match &cfg.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
