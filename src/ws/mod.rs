//! Review channel supervisor.
//!
//! Binds the WebSocket port, accepts duplex connections, and runs one
//! [`ReviewSession`] per connection in its own task. A session failing or
//! stalling never touches the accept loop or any other session. On SIGTERM /
//! Ctrl-C the supervisor stops accepting and waits (up to [`DRAIN_TIMEOUT`])
//! for in-flight sessions to close on their own before returning.

use crate::review::session::ReviewSession;
use crate::AppContext;
use anyhow::Result;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing::{debug, error, info, warn};

/// How long to wait for open review channels to close after the shutdown
/// signal. Sessions end when their clients disconnect; the bound keeps a
/// stuck client from holding the process open forever.
const DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    run_with_shutdown(ctx, make_shutdown_future()).await
}

/// Accept loop with an explicit shutdown trigger, so tests can drive the
/// drain path without delivering process signals.
pub async fn run_with_shutdown(
    ctx: Arc<AppContext>,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "review server listening (WebSocket + HTTP health on same port)");

    // Pinned so we can use it in the select! loop without moving.
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("shutdown signal received — draining review channels and stopping");
                drain_sessions(&ctx).await;
                break;
            }

            conn = listener.accept() => {
                let (stream, peer) = match conn {
                    Ok(c) => c,
                    Err(e) => {
                        error!(err = %e, "accept error");
                        continue;
                    }
                };
                debug!(peer = %peer, "new connection");
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, ctx).await {
                        warn!(peer = %peer, err = %e, "connection error");
                    }
                });
            }
        }
    }

    info!("review server stopped");
    Ok(())
}

/// Wait for in-flight sessions to reach `Closed` on their own, bounded by
/// [`DRAIN_TIMEOUT`]. Spawned session tasks would otherwise be aborted when
/// the runtime drops — a forced cutoff mid-round.
async fn drain_sessions(ctx: &AppContext) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    loop {
        let active = ctx.active_sessions.load(Ordering::Relaxed);
        if active == 0 {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            warn!(active, "drain timed out — exiting with sessions still open");
            return;
        }
        debug!(active, "waiting for review channels to close");
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
}

/// Returns a future that resolves when a shutdown signal is received.
///
/// On Unix we listen for SIGTERM *and* Ctrl-C.
/// On other platforms we listen for Ctrl-C only.
async fn make_shutdown_future() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}

async fn handle_connection(stream: tokio::net::TcpStream, ctx: Arc<AppContext>) -> Result<()> {
    // The WebSocket port doubles as a plain-HTTP liveness endpoint. A WS
    // upgrade also starts with "GET ", so peek for the /health path
    // specifically; everything else falls through to the WS handshake.
    let mut peek_buf = [0u8; 12];
    let n = match stream.peek(&mut peek_buf).await {
        Ok(n) => n,
        Err(e) => {
            debug!(err = %e, "peek failed — falling through to WS handshake");
            0
        }
    };
    // Trailing space keeps /health-prefixed WS paths (e.g. /healthz) out.
    if n >= 12 && &peek_buf[..12] == b"GET /health " {
        return handle_health_check(stream, &ctx).await;
    }

    let ws = accept_async(stream).await?;

    ctx.active_sessions.fetch_add(1, Ordering::Relaxed);
    let result = ReviewSession::new(ctx.completions.clone()).run(ws).await;
    ctx.active_sessions.fetch_sub(1, Ordering::Relaxed);
    result
}

/// Respond to an HTTP `GET /health` request with a JSON status document,
/// so clients can check liveness without a WS library.
async fn handle_health_check(mut stream: tokio::net::TcpStream, ctx: &AppContext) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Consume the request (we don't inspect it — any GET /health is fine).
    let mut req_buf = vec![0u8; 2048];
    let _ = stream.read(&mut req_buf).await;

    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": ctx.started_at.elapsed().as_secs(),
        "activeSessions": ctx.active_sessions.load(Ordering::Relaxed),
        "port": ctx.config.port,
    });
    let body_str = body.to_string();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body_str.len(),
        body_str
    );
    stream.write_all(response.as_bytes()).await?;
    Ok(())
}
