/// Single-bet controller: foreground load on demand, background refresh when
/// the countdown fires, diff logged after each background snapshot.

use std::sync::Arc;

use bet_diff::DiffReporter;
use bet_gateway::{BetGateway, FetchError};
use bet_model::BetViewResponse;
use logger::{now_iso, BetLoadFailedEvent, BetLoadedEvent, EventLogger, RefreshFiredEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::countdown::{now_ms, Countdown};
use crate::error::BetViewErrorKind;
use crate::token::{Applied, RequestToken};
use crate::view::{BetViewStore, ViewState};
use crate::ControllerOptions;

#[derive(Debug, Clone)]
pub enum ViewAction {
    SetBetId(String),
    LoadBet,
    LoadBetBackground,
    SwapToForeground,
}

impl ViewAction {
    /// What a manual retry should do in state `st`: reload the foreground
    /// when there is nothing good to show, otherwise refresh in background.
    pub fn manual_reload(st: &ViewState) -> ViewAction {
        if st.bet.is_none() || st.error.is_some() {
            ViewAction::LoadBet
        } else {
            ViewAction::LoadBetBackground
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Foreground,
    Background,
}

impl Lane {
    fn as_str(&self) -> &'static str {
        match self {
            Lane::Foreground => "foreground",
            Lane::Background => "background",
        }
    }
}

struct Fetched {
    lane:   Lane,
    token:  RequestToken,
    bet_id: String,
    result: Result<BetViewResponse, FetchError>,
}

pub struct ViewController {
    actions: mpsc::Sender<ViewAction>,
    state:   watch::Receiver<ViewState>,
    task:    JoinHandle<()>,
}

impl ViewController {
    pub fn spawn(gateway: Arc<BetGateway>, opts: ControllerOptions) -> Self {
        let store = BetViewStore::new();
        let (state_tx, state_rx) = watch::channel(store.state().clone());
        let (action_tx, action_rx) = mpsc::channel(32);

        let task = tokio::spawn(run(store, gateway, opts, action_rx, state_tx));

        Self { actions: action_tx, state: state_rx, task }
    }

    /// `false` once the controller task is gone.
    pub async fn dispatch(&self, action: ViewAction) -> bool {
        self.actions.send(action).await.is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ── Task ─────────────────────────────────────────────────────────────────────

async fn run(
    mut store:   BetViewStore,
    gateway:     Arc<BetGateway>,
    opts:        ControllerOptions,
    mut actions: mpsc::Receiver<ViewAction>,
    state_tx:    watch::Sender<ViewState>,
) {
    let logger = EventLogger::new(&opts.log_dir);
    let reporter = DiffReporter::new(&opts.log_dir);
    let (done_tx, mut done_rx) = mpsc::channel::<Fetched>(8);
    let mut foreground: Option<JoinHandle<()>> = None;
    let mut background: Option<JoinHandle<()>> = None;
    let mut countdown = Countdown::new();

    let mut ticker = tokio::time::interval(opts.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            action = actions.recv() => {
                let Some(action) = action else { break };
                match action {
                    ViewAction::SetBetId(id) => {
                        if store.set_bet_id(id) {
                            for h in [foreground.take(), background.take()].into_iter().flatten() {
                                h.abort();
                            }
                            countdown.set_target(None);
                        }
                    }
                    ViewAction::LoadBet => {
                        if let Some((token, id)) = store.load_bet() {
                            restart(&mut foreground, spawn_fetch(&gateway, &done_tx, Lane::Foreground, token, id));
                        }
                    }
                    ViewAction::LoadBetBackground => {
                        if let Some((token, id)) = store.load_bet_background() {
                            restart(&mut background, spawn_fetch(&gateway, &done_tx, Lane::Background, token, id));
                        }
                    }
                    ViewAction::SwapToForeground => store.swap_to_foreground(),
                }
            }
            Some(Fetched { lane, token, bet_id, result }) = done_rx.recv() => {
                let failure = result.as_ref().err().map(|e| e.to_string());
                let applied = match lane {
                    Lane::Foreground => store.apply_bet_result(token, result),
                    Lane::Background => store.apply_background_result(token, result),
                };
                if applied == Applied::Stale {
                    continue;
                }

                let st = store.state();
                match failure {
                    None => {
                        countdown.set_target(st.next_refresh_ts);
                        log_loaded(&logger, lane, st);
                        if lane == Lane::Background {
                            reporter.report(st.bet.as_ref(), st.bet_background.as_ref());
                        }
                    }
                    Some(reason) => {
                        let kind = match lane {
                            Lane::Foreground => st.error,
                            Lane::Background => st.error_background,
                        };
                        log_failed(&logger, lane, &bet_id, kind, reason);
                    }
                }
            }
            _ = ticker.tick() => {
                if countdown.tick(now_ms()).fired {
                    let target_ts = countdown.target().unwrap_or_default();
                    info!(target_ts, "bet refresh");
                    let _ = logger.log(&RefreshFiredEvent {
                        ts:    now_iso(),
                        event: "REFRESH_FIRED",
                        view:  "bet",
                        target_ts,
                    });
                    if let Some((token, id)) = store.load_bet_background() {
                        restart(&mut background, spawn_fetch(&gateway, &done_tx, Lane::Background, token, id));
                    }
                }
            }
        }
        countdown.set_enabled(store.state().countdown_enabled());
        state_tx.send_replace(store.state().clone());
    }
}

fn spawn_fetch(
    gateway: &Arc<BetGateway>,
    done_tx: &mpsc::Sender<Fetched>,
    lane:    Lane,
    token:   RequestToken,
    bet_id:  String,
) -> JoinHandle<()> {
    let gateway = Arc::clone(gateway);
    let done_tx = done_tx.clone();
    tokio::spawn(async move {
        let result = gateway.fetch_bet(&bet_id).await;
        let _ = done_tx.send(Fetched { lane, token, bet_id, result }).await;
    })
}

fn restart(inflight: &mut Option<JoinHandle<()>>, next: JoinHandle<()>) {
    if let Some(prev) = inflight.replace(next) {
        prev.abort();
    }
}

fn log_loaded(logger: &EventLogger, lane: Lane, st: &ViewState) {
    let bet = match lane {
        Lane::Foreground => st.bet.as_ref(),
        Lane::Background => st.bet_background.as_ref(),
    };
    let Some(bet) = bet else { return };

    info!(
        lane = lane.as_str(),
        bet_id = bet.id(),
        avg_reward = bet.info().avg_reward,
        next_refresh_ts = ?st.next_refresh_ts,
        "bet loaded"
    );
    let _ = logger.log(&BetLoadedEvent {
        ts:              now_iso(),
        event:           "BET_LOADED",
        lane:            lane.as_str(),
        bet_id:          bet.id(),
        result_type:     bet.kind().as_str().to_string(),
        avg_reward:      bet.info().avg_reward,
        next_refresh_ts: st.next_refresh_ts,
    });
}

fn log_failed(logger: &EventLogger, lane: Lane, bet_id: &str, kind: Option<BetViewErrorKind>, reason: String) {
    let kind = kind.unwrap_or(BetViewErrorKind::ResponseError);
    warn!(lane = lane.as_str(), bet_id, kind = kind.as_str(), %reason, "bet load failed");
    let _ = logger.log(&BetLoadFailedEvent {
        ts:     now_iso(),
        event:  "BET_LOAD_FAILED",
        lane:   lane.as_str(),
        bet_id: bet_id.to_string(),
        kind:   kind.as_str().to_string(),
        reason,
    });
}
