use std::net::SocketAddr;

use anyhow::{Context, Result};
use bet_store::IndexState;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Read-only state plus one command: `POST /reload` sends on `reload`.
pub async fn start_http_server(
    bind:   SocketAddr,
    state:  watch::Receiver<IndexState>,
    reload: mpsc::Sender<()>,
) -> Result<()> {
    let listener = TcpListener::bind(bind).await.context("http bind")?;
    info!("bet-watch http listening on http://{} (GET /health, /state, /bets; POST /reload)", bind);
    serve(listener, state, reload).await
}

pub async fn serve(listener: TcpListener, state: watch::Receiver<IndexState>, reload: mpsc::Sender<()>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("http accept")?;
        let state = state.clone();
        let reload = reload.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_http_connection(stream, state, reload).await {
                debug!("http handler err {}: {}", peer, e);
            }
        });
    }
}

async fn handle_http_connection(
    mut stream: TcpStream,
    state:      watch::Receiver<IndexState>,
    reload:     mpsc::Sender<()>,
) -> Result<()> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await.context("http read")?;
    if n == 0 {
        return Ok(());
    }

    let req = String::from_utf8_lossy(&buf[..n]);
    let first_line = req.lines().next().unwrap_or_default();
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");

    // snapshot, nothing is held across the write
    let snap = state.borrow().clone();

    let (status_line, content_type, body) = match (method, path) {
        ("GET", "/health") => ("HTTP/1.1 200 OK", "text/plain; charset=utf-8", "ok".to_string()),
        ("GET", "/state") => {
            let json = serde_json::to_string_pretty(&snap).unwrap_or_else(|_| "{}".to_string());
            ("HTTP/1.1 200 OK", "application/json; charset=utf-8", json)
        }
        ("GET", "/bets") => {
            let json = serde_json::to_string_pretty(&snap.visible_bets_for_params())
                .unwrap_or_else(|_| "[]".to_string());
            ("HTTP/1.1 200 OK", "application/json; charset=utf-8", json)
        }
        ("POST", "/reload") => match reload.try_send(()) {
            // Full: a reload is already queued
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {
                ("HTTP/1.1 202 Accepted", "text/plain; charset=utf-8", "reloading".to_string())
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                ("HTTP/1.1 503 Service Unavailable", "text/plain; charset=utf-8", "stopped".to_string())
            }
        },
        _ => (
            "HTTP/1.1 404 Not Found",
            "text/plain; charset=utf-8",
            "not found".to_string(),
        ),
    };

    let resp = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.as_bytes().len(),
        body
    );
    stream.write_all(resp.as_bytes()).await.context("http write")?;
    Ok(())
}
