/// FreeBets — Logger
/// JSONL event stream (logs/YYYY-MM-DD.jsonl), append-only audit trail

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct BetsLoadedEvent {
    pub ts:              String,
    pub event:           &'static str,   // "BETS_LOADED"
    pub single_bets:     usize,
    pub multi_bets:      usize,
    pub track_codes:     Vec<String>,
    pub next_refresh_ts: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct BetsLoadFailedEvent {
    pub ts:     String,
    pub event:  &'static str,   // "BETS_LOAD_FAILED"
    pub kind:   String,         // "RESPONSE_ERROR" | "NO_BETS_ERROR"
    pub reason: String,
}

#[derive(Serialize, Debug)]
pub struct BetLoadedEvent {
    pub ts:              String,
    pub event:           &'static str,   // "BET_LOADED"
    pub lane:            &'static str,   // "foreground" | "background"
    pub bet_id:          i64,
    pub result_type:     String,         // "single" | "multi"
    pub avg_reward:      f64,
    pub next_refresh_ts: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct BetLoadFailedEvent {
    pub ts:     String,
    pub event:  &'static str,   // "BET_LOAD_FAILED"
    pub lane:   &'static str,
    pub bet_id: String,
    pub kind:   String,         // "RESPONSE_ERROR" | "NOT_FOUND_ERROR"
    pub reason: String,
}

#[derive(Serialize, Debug)]
pub struct BetDiffEvent {
    pub ts:              String,
    pub event:           &'static str,   // "BET_DIFF"
    pub bet_id:          i64,
    pub min_reward_diff: f64,
    pub avg_reward_diff: f64,
    pub max_reward_diff: f64,
    pub trend:           String,         // "UNCHANGED" | "INCREASE" | "DECREASE"
}

#[derive(Serialize, Debug)]
pub struct RefreshFiredEvent {
    pub ts:        String,
    pub event:     &'static str,   // "REFRESH_FIRED"
    pub view:      &'static str,   // "index" | "bet"
    pub target_ts: i64,
}
