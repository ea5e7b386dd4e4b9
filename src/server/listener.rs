use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::http::handler::RequestHandler;
use crate::server::pool::{Job, WorkerPool};

/// Pause after a failed accept, so fd exhaustion does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Binds the configured address and serves until `shutdown` resolves.
pub async fn run(
    cfg: &ServerConfig,
    handler: Arc<RequestHandler>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, cfg, handler, shutdown).await;
    Ok(())
}

/// Accept loop over an already bound listener.
///
/// Each accepted connection is queued on a bounded worker pool. When
/// `shutdown` resolves the loop stops accepting and waits for queued and
/// in-flight connections to finish.
pub async fn serve(
    listener: TcpListener,
    cfg: &ServerConfig,
    handler: Arc<RequestHandler>,
    shutdown: impl Future<Output = ()>,
) {
    let pool = WorkerPool::new(cfg.workers, cfg.queue_depth, cfg.overflow);
    let deadlines = cfg.deadlines();
    info!(
        workers = pool.size(),
        queue_depth = cfg.queue_depth,
        overflow = ?pool.policy(),
        root = %handler.root().path().display(),
        "Serving files"
    );

    tokio::pin!(shutdown);

    loop {
        let (socket, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        tracing::debug!("Accepted connection from {}", peer);

        let conn = Connection::new(socket, peer.to_string(), Arc::clone(&handler), deadlines);
        let job: Job = Box::pin(async move {
            conn.run().await;
        });

        // Under the block policy this waits for a free slot; dropping the
        // pending submit on shutdown closes the connection it carries.
        let submitted = tokio::select! {
            submitted = pool.submit(job) => submitted,
            _ = &mut shutdown => {
                info!(peer = %peer, "Shutdown signal received while queue was full");
                break;
            }
        };

        if let Err(e) = submitted {
            tracing::warn!(peer = %peer, error = %e, "Dropping connection");
        }
    }

    pool.shutdown().await;
    info!("All connections finished");
}
