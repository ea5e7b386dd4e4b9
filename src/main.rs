use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use lantern::cli::Cli;
use lantern::fs::DocumentRoot;
use lantern::http::handler::RequestHandler;
use lantern::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Cli::parse().into_config()?;
    logging::init(&cfg.logging)?;

    let root = DocumentRoot::open(&cfg.static_files.root).with_context(|| {
        format!(
            "invalid document root {}",
            cfg.static_files.root.display()
        )
    })?;
    let handler = Arc::new(RequestHandler::new(root));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    server::listener::run(&cfg.server, handler, shutdown).await
}
