/// Fake bets backend for tests.
///
/// Minimal HTTP/1.1 server on 127.0.0.1 answering canned JSON bodies per
/// route, recording every request target it sees.

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct FakeRoute {
    /// Exact path, or exact path + query when it contains `?`
    target: String,
    status: u16,
    body:   String,
    delay:  Duration,
}

pub struct FakeApi {
    addr:     SocketAddr,
    routes:   Arc<Mutex<Vec<FakeRoute>>>,
    requests: Arc<Mutex<Vec<String>>>,
    task:     JoinHandle<()>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake api");
        let addr = listener.local_addr().expect("fake api addr");
        let routes: Arc<Mutex<Vec<FakeRoute>>> = Arc::new(Mutex::new(Vec::new()));
        let requests: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = Arc::clone(&routes);
                    let requests = Arc::clone(&requests);
                    tokio::spawn(async move {
                        let _ = handle(stream, routes, requests).await;
                    });
                }
            })
        };

        Self { addr, routes, requests, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replaces any route registered for the same target.
    pub fn route(&self, target: &str, status: u16, body: impl Into<String>) {
        self.route_delayed(target, status, body, Duration::ZERO);
    }

    pub fn route_delayed(&self, target: &str, status: u16, body: impl Into<String>, delay: Duration) {
        let mut routes = self.routes.lock().unwrap();
        routes.retain(|r| r.target != target);
        routes.push(FakeRoute { target: target.to_string(), status, body: body.into(), delay });
    }

    /// Request targets (path + query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    mut stream: TcpStream,
    routes: Arc<Mutex<Vec<FakeRoute>>>,
    requests: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::with_capacity(2048);
    let mut chunk = [0u8; 2048];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let req = String::from_utf8_lossy(&buf);
    let first_line = req.lines().next().unwrap_or_default();
    let target = first_line.split_whitespace().nth(1).unwrap_or("").to_string();
    let path = target.split('?').next().unwrap_or("").to_string();
    requests.lock().unwrap().push(target.clone());

    let route = {
        let routes = routes.lock().unwrap();
        routes.iter().find(|r| r.target == target).cloned()
            .or_else(|| routes.iter().find(|r| !r.target.contains('?') && r.target == path).cloned())
    };

    let (status, body, delay) = match route {
        Some(r) => (r.status, r.body, r.delay),
        None    => (404, r#"{"detail":"Not Found"}"#.to_string(), Duration::ZERO),
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let resp = format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reason(status),
        body.as_bytes().len(),
        body
    );
    stream.write_all(resp.as_bytes()).await?;
    stream.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _   => "Status",
    }
}

// ── Payload builders ─────────────────────────────────────────────────────────

pub fn race_json(track_code: &str, post_time_stamp: Option<i64>) -> Value {
    json!({
        "track_code": track_code,
        "race_number": 1,
        "race_date": "2021-11-06",
        "mtp": 10,
        "status": "open",
        "post_time": null,
        "post_time_stamp": post_time_stamp,
        "win_pool_total": 1000.0,
        "place_pool_total": 500.0,
        "show_pool_total": 250.0
    })
}

/// Single bet with rewards `(min, avg, max)`.
pub fn single_bet_json(id: i64, track_code: &str, post_time_stamp: Option<i64>, rewards: (f64, f64, f64)) -> Value {
    json!({
        "id": id,
        "title": format!("Win {}", track_code.to_uppercase()),
        "description": "",
        "predicted_odds": 3.0,
        "min_reward": rewards.0,
        "avg_reward": rewards.1,
        "max_reward": rewards.2,
        "cost": 2.0,
        "bet_type": "BetType.WIN_BET",
        "bet_strategy_type": "BetStrategyType.BOOK_WIN_BET",
        "tags": [{"id": 1, "name": "Free", "description": "free bet"}],
        "race": race_json(track_code, post_time_stamp),
        "active_entries": [],
        "inactive_entries": []
    })
}

pub fn multi_bet_json(id: i64, sub_bets: Vec<Value>, rewards: (f64, f64, f64)) -> Value {
    json!({
        "id": id,
        "title": "Box Win",
        "description": "",
        "predicted_odds": 1.8,
        "min_reward": rewards.0,
        "avg_reward": rewards.1,
        "max_reward": rewards.2,
        "cost": 4.0,
        "bet_type": "BetType.BOX_WIN_ARB",
        "bet_strategy_type": "BetStrategyType.BOOK_BOX_WIN_ARB",
        "tags": [],
        "sub_bets": sub_bets
    })
}

pub fn list_body(single_bets: Vec<Value>, multi_bets: Vec<Value>, all_track_codes: &[&str], next_refresh_ts: Option<i64>) -> String {
    let mut track_codes: Vec<String> = Vec::new();
    for b in single_bets.iter() {
        if let Some(tc) = b["race"]["track_code"].as_str() {
            if !track_codes.iter().any(|t| t == tc) {
                track_codes.push(tc.to_string());
            }
        }
    }
    json!({
        "single_bets": single_bets,
        "multi_bets": multi_bets,
        "skip": 0,
        "limit": 2000,
        "track_codes": track_codes,
        "bet_types": ["BetType.WIN_BET"],
        "bet_strat_types": ["BetStrategyType.BOOK_WIN_BET"],
        "all_track_codes": all_track_codes,
        "all_bet_types": ["BetType.WIN_BET", "BetType.BOX_WIN_ARB"],
        "all_bet_strat_types": ["BetStrategyType.BOOK_WIN_BET", "BetStrategyType.BOOK_BOX_WIN_ARB"],
        "next_refresh_ts": next_refresh_ts
    })
    .to_string()
}

pub fn view_body(bet: Value, result_type: &str, next_refresh_ts: i64) -> String {
    json!({
        "data": bet,
        "result_type": result_type,
        "next_refresh_ts": next_refresh_ts
    })
    .to_string()
}
