/// FreeBets — Snapshot Store + Refresh Scheduler
///
/// Stav obou pohledů (seznam betů, detail betu) jako explicitní stavové
/// automaty. Každý pohled vlastní jeden controller task:
///   action → fetch task → výsledek s tokenem → store (latest wins)

pub mod countdown;
pub mod error;
pub mod index;
pub mod index_controller;
pub mod token;
pub mod view;
pub mod view_controller;

pub use countdown::{now_ms, Countdown, Tick, TimeLeft};
pub use error::{BetViewErrorKind, BetsErrorKind};
pub use index::{BetIndexStore, IndexState};
pub use index_controller::{IndexAction, IndexController};
pub use token::{Applied, RequestLane, RequestToken};
pub use view::{BetViewStore, ViewState};
pub use view_controller::{ViewAction, ViewController};

use std::path::PathBuf;
use std::time::Duration;

/// Settings shared by both controllers
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Countdown polling interval
    pub tick:    Duration,
    pub log_dir: PathBuf,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            tick:    Duration::from_secs(1),
            log_dir: PathBuf::from("logs"),
        }
    }
}
