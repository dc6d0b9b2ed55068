/// Refresh countdown.
///
/// Remaining time is always `target - now`, recomputed on every tick; nothing
/// is decremented in place. A target fires at most once.

use chrono::Utc;
use serde::Serialize;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// `None` without a target
    pub remaining_ms: Option<i64>,
    pub fired:        bool,
}

#[derive(Debug, Clone, Default)]
pub struct Countdown {
    target:  Option<i64>,
    enabled: bool,
    fired:   bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// New target (epoch ms). Always re-arms, even for an equal timestamp.
    pub fn set_target(&mut self, target: Option<i64>) {
        self.target = target;
        self.fired = false;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn target(&self) -> Option<i64> {
        self.target
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn remaining_ms(&self, now_ms: i64) -> Option<i64> {
        self.target.map(|t| t.saturating_sub(now_ms).max(0))
    }

    pub fn tick(&mut self, now_ms: i64) -> Tick {
        let remaining_ms = self.remaining_ms(now_ms);
        let fired = match remaining_ms {
            Some(0) if self.enabled && !self.fired => {
                self.fired = true;
                true
            }
            _ => false,
        };
        Tick { remaining_ms, fired }
    }
}

// ── Display ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeLeft {
    pub hours:   i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    /// `None` once elapsed
    pub fn from_remaining(remaining_ms: i64) -> Option<Self> {
        if remaining_ms <= 0 {
            return None;
        }
        Some(Self {
            hours:   (remaining_ms / 3_600_000) % 24,
            minutes: (remaining_ms / 60_000) % 60,
            seconds: (remaining_ms / 1_000) % 60,
        })
    }

    /// `HH:MM:SS`, or `end_text` once elapsed
    pub fn display(remaining_ms: i64, end_text: &str) -> String {
        match Self::from_remaining(remaining_ms) {
            Some(t) => format!("{:02}:{:02}:{:02}", t.hours, t.minutes, t.seconds),
            None    => end_text.to_string(),
        }
    }
}
