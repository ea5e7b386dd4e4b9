mod common;

use std::net::SocketAddr;
use std::time::Duration;

use common::{HELLO, Site};
use lantern::config::ServerConfig;
use lantern::server::listener::serve;
use lantern::server::pool::OverflowPolicy;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Running {
    async fn stop(self) {
        let _ = self.stop.send(());
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not shut down")
            .unwrap();
    }
}

async fn start(site: &Site, cfg: ServerConfig) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = site.handler();
    let (stop, stopped) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        serve(listener, &cfg, handler, async {
            let _ = stopped.await;
        })
        .await;
    });

    Running { addr, stop, task }
}

async fn get(addr: SocketAddr, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut received = Vec::new();
    stream.read_to_end(&mut received).await.unwrap();
    String::from_utf8_lossy(&received).into_owned()
}

fn config(workers: usize) -> ServerConfig {
    ServerConfig {
        workers,
        read_timeout_secs: 2,
        write_timeout_secs: 2,
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn test_serves_file_over_tcp() {
    let site = Site::new();
    let server = start(&site, config(2)).await;

    let response = get(server.addr, "/hello.txt").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with(std::str::from_utf8(HELLO).unwrap()));

    server.stop().await;
}

#[tokio::test]
async fn test_traversal_over_tcp_is_404() {
    let site = Site::new();
    let server = start(&site, config(1)).await;

    let response = get(server.addr, "/../secret.txt").await;
    assert!(response.starts_with("HTTP/1.1 404 File not found\r\n"));
    assert!(!response.contains("top secret"));

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients_all_served() {
    let site = Site::new();
    let server = start(&site, config(4)).await;

    let clients: Vec<_> = (0..16)
        .map(|_| tokio::spawn(get(server.addr, "/hello.txt")))
        .collect();

    for client in clients {
        let response = client.await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    }

    server.stop().await;
}

#[tokio::test]
async fn test_reject_policy_closes_overflowing_connection() {
    let site = Site::new();
    let cfg = ServerConfig {
        workers: 1,
        queue_depth: 1,
        overflow: OverflowPolicy::Reject,
        read_timeout_secs: 5,
        write_timeout_secs: 5,
        ..ServerConfig::default()
    };
    let server = start(&site, cfg).await;

    // One silent client occupies the worker, a second fills the queue.
    let busy = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let queued = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut rejected = TcpStream::connect(server.addr).await.unwrap();
    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(2), rejected.read(&mut buf))
        .await
        .expect("rejected connection was left open");
    assert_eq!(read.unwrap_or(0), 0);

    drop(busy);
    drop(queued);
    server.stop().await;
}

#[tokio::test]
async fn test_silent_client_does_not_starve_others() {
    let site = Site::new();
    let cfg = ServerConfig {
        read_timeout_secs: 1,
        ..config(1)
    };
    let server = start(&site, cfg).await;

    let mut silent = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Served once the silent client's read deadline expires.
    let response = tokio::time::timeout(Duration::from_secs(5), get(server.addr, "/hello.txt"))
        .await
        .expect("request was never served");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));

    let mut buf = Vec::new();
    let _ = silent.read_to_end(&mut buf).await;
    assert!(buf.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let site = Site::new();
    let server = start(&site, config(1)).await;
    let addr = server.addr;

    server.stop().await;

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_shutdown_while_blocked_on_full_queue() {
    let site = Site::new();
    let cfg = ServerConfig {
        workers: 1,
        queue_depth: 1,
        overflow: OverflowPolicy::Block,
        read_timeout_secs: 5,
        write_timeout_secs: 5,
        ..ServerConfig::default()
    };
    let Running { addr, stop, task } = start(&site, cfg).await;

    // Worker busy, queue full, third connection waits in the acceptor.
    let busy = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let queued = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut waiting = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    stop.send(()).unwrap();

    // The waiting connection is closed long before the busy one times out.
    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(2), waiting.read(&mut buf))
        .await
        .expect("blocked connection outlived the shutdown signal");
    assert_eq!(read.unwrap_or(0), 0);

    drop(busy);
    drop(queued);
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("server did not shut down")
        .unwrap();
}
