/// FreeBets — Diff Evaluator
/// Porovnává zobrazený bet (foreground) s čerstvě staženým (background)
/// Observe only: loguje změnu výplaty, nic nemění

use bet_model::Bet;
use logger::{now_iso, BetDiffEvent, EventLogger};
use serde::Serialize;
use tracing::info;

/// Reward deltas `current - base`, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BetDiffDescriptor {
    pub min_reward_diff: f64,
    pub avg_reward_diff: f64,
    pub max_reward_diff: f64,
}

fn round2(v: f64) -> f64 {
    // f64::round is half-away-from-zero, so round2(-x) == -round2(x)
    (v * 100.0).round() / 100.0
}

pub fn bet_diff(base: &Bet, current: &Bet) -> BetDiffDescriptor {
    let b = base.info();
    let c = current.info();
    BetDiffDescriptor {
        min_reward_diff: round2(c.min_reward - b.min_reward),
        avg_reward_diff: round2(c.avg_reward - b.avg_reward),
        max_reward_diff: round2(c.max_reward - b.max_reward),
    }
}

/// `None` while either snapshot is missing; that is "not available yet",
/// never a zero diff. Snapshots of two different bets never compare.
pub fn diff_snapshots(base: Option<&Bet>, current: Option<&Bet>) -> Option<BetDiffDescriptor> {
    let (base, current) = (base?, current?);
    if base.id() != current.id() {
        return None;
    }
    Some(bet_diff(base, current))
}

// ── Trend ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffTrend {
    Unchanged,
    Increase,
    Decrease,
}

impl DiffTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffTrend::Unchanged => "UNCHANGED",
            DiffTrend::Increase  => "INCREASE",
            DiffTrend::Decrease  => "DECREASE",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DiffTrend::Unchanged => "No recent value change.",
            DiffTrend::Increase  => "Avg Payout Increase",
            DiffTrend::Decrease  => "Avg Payout Decrease",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            DiffTrend::Unchanged => "This bet's value is unchanged since the last refresh.",
            DiffTrend::Increase  => "This bet's average payout has increased since the last refresh.",
            DiffTrend::Decrease  => "This bet's average payout has decreased since the last refresh.",
        }
    }
}

impl BetDiffDescriptor {
    pub fn trend(&self) -> DiffTrend {
        if self.avg_reward_diff > 0.0 {
            DiffTrend::Increase
        } else if self.avg_reward_diff < 0.0 {
            DiffTrend::Decrease
        } else {
            DiffTrend::Unchanged
        }
    }

    pub fn is_zero(&self) -> bool {
        self.min_reward_diff == 0.0 && self.avg_reward_diff == 0.0 && self.max_reward_diff == 0.0
    }
}

// ── DiffReporter ─────────────────────────────────────────────────────────────

pub struct DiffReporter {
    logger: EventLogger,
}

impl DiffReporter {
    pub fn new(log_dir: impl Into<std::path::PathBuf>) -> Self {
        Self { logger: EventLogger::new(log_dir) }
    }

    /// Logs the diff between the displayed and the refreshed snapshot.
    pub fn report(&self, foreground: Option<&Bet>, background: Option<&Bet>) -> Option<BetDiffDescriptor> {
        let fg = foreground?;
        let diff = diff_snapshots(foreground, background)?; // diff zatím není
        let trend = diff.trend();

        info!(
            bet_id = fg.id(),
            min = format!("{:+.2}", diff.min_reward_diff),
            avg = format!("{:+.2}", diff.avg_reward_diff),
            max = format!("{:+.2}", diff.max_reward_diff),
            "{}",
            trend.title()
        );

        let _ = self.logger.log(&BetDiffEvent {
            ts:              now_iso(),
            event:           "BET_DIFF",
            bet_id:          fg.id(),
            min_reward_diff: diff.min_reward_diff,
            avg_reward_diff: diff.avg_reward_diff,
            max_reward_diff: diff.max_reward_diff,
            trend:           trend.as_str().to_string(),
        });

        Some(diff)
    }
}
