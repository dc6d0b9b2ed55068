/// Bets index controller.
///
/// Owns the [`BetIndexStore`] inside one task. Actions arrive over mpsc,
/// fetches run in their own tasks and report back with their token, every
/// state change is published on a watch channel.

use std::sync::Arc;

use bet_gateway::{BetGateway, FetchError};
use bet_model::{BetSearchParams, BetsListResponse};
use logger::{now_iso, BetsLoadFailedEvent, BetsLoadedEvent, EventLogger, RefreshFiredEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::countdown::{now_ms, Countdown};
use crate::error::BetsErrorKind;
use crate::index::{BetIndexStore, IndexState};
use crate::token::{Applied, RequestToken};
use crate::ControllerOptions;

#[derive(Debug, Clone)]
pub enum IndexAction {
    LoadBets,
    SetBetSearchParams(BetSearchParams),
    SetCountdownRefreshEnabled(bool),
}

struct Fetched {
    token:  RequestToken,
    result: Result<BetsListResponse, FetchError>,
}

pub struct IndexController {
    actions: mpsc::Sender<IndexAction>,
    state:   watch::Receiver<IndexState>,
    task:    JoinHandle<()>,
}

impl IndexController {
    pub fn spawn(gateway: Arc<BetGateway>, default_params: BetSearchParams, opts: ControllerOptions) -> Self {
        let store = BetIndexStore::new(default_params);
        let (state_tx, state_rx) = watch::channel(store.state().clone());
        let (action_tx, action_rx) = mpsc::channel(32);

        let task = tokio::spawn(run(store, gateway, opts, action_rx, state_tx));

        Self { actions: action_tx, state: state_rx, task }
    }

    /// `false` once the controller task is gone.
    pub async fn dispatch(&self, action: IndexAction) -> bool {
        self.actions.send(action).await.is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<IndexState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> IndexState {
        self.state.borrow().clone()
    }
}

impl Drop for IndexController {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ── Task ─────────────────────────────────────────────────────────────────────

async fn run(
    mut store:   BetIndexStore,
    gateway:     Arc<BetGateway>,
    opts:        ControllerOptions,
    mut actions: mpsc::Receiver<IndexAction>,
    state_tx:    watch::Sender<IndexState>,
) {
    let logger = EventLogger::new(&opts.log_dir);
    let (done_tx, mut done_rx) = mpsc::channel::<Fetched>(8);
    let mut inflight: Option<JoinHandle<()>> = None;
    let mut countdown = Countdown::new();

    let mut ticker = tokio::time::interval(opts.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            action = actions.recv() => {
                let Some(action) = action else { break };
                match action {
                    IndexAction::LoadBets => {
                        let (token, params) = store.load_bets();
                        countdown.set_enabled(false);
                        restart(&mut inflight, spawn_fetch(&gateway, &done_tx, token, params));
                    }
                    IndexAction::SetBetSearchParams(params) => {
                        let (token, params) = store.set_bet_search_params(params);
                        countdown.set_enabled(false);
                        restart(&mut inflight, spawn_fetch(&gateway, &done_tx, token, params));
                    }
                    IndexAction::SetCountdownRefreshEnabled(enabled) => {
                        store.set_countdown_refresh_enabled(enabled);
                        countdown.set_enabled(enabled);
                    }
                }
            }
            Some(Fetched { token, result }) = done_rx.recv() => {
                let failure = result.as_ref().err().map(|e| e.to_string());
                if store.apply_bets_result(token, result) == Applied::Stale {
                    continue;
                }
                let st = store.state();
                countdown.set_target(st.next_refresh_ts);
                countdown.set_enabled(st.countdown_refresh_enabled);
                log_outcome(&logger, st, failure);
            }
            _ = ticker.tick() => {
                let tick = countdown.tick(now_ms());
                if !tick.fired {
                    continue;
                }
                let target_ts = countdown.target().unwrap_or_default();
                info!(target_ts, "index refresh");
                let _ = logger.log(&RefreshFiredEvent {
                    ts:    now_iso(),
                    event: "REFRESH_FIRED",
                    view:  "index",
                    target_ts,
                });
                let (token, params) = store.load_bets();
                countdown.set_enabled(false);
                restart(&mut inflight, spawn_fetch(&gateway, &done_tx, token, params));
            }
        }
        state_tx.send_replace(store.state().clone());
    }
}

fn spawn_fetch(
    gateway: &Arc<BetGateway>,
    done_tx: &mpsc::Sender<Fetched>,
    token:   RequestToken,
    params:  BetSearchParams,
) -> JoinHandle<()> {
    let gateway = Arc::clone(gateway);
    let done_tx = done_tx.clone();
    tokio::spawn(async move {
        let result = gateway.fetch_bet_list(&params).await;
        let _ = done_tx.send(Fetched { token, result }).await;
    })
}

/// Superseded fetch is aborted; its token is stale anyway.
fn restart(inflight: &mut Option<JoinHandle<()>>, next: JoinHandle<()>) {
    if let Some(prev) = inflight.replace(next) {
        prev.abort();
    }
}

fn log_outcome(logger: &EventLogger, st: &IndexState, failure: Option<String>) {
    match st.error {
        None => {
            let list = &st.current_bet_list;
            info!(
                single = list.single_bets.len(),
                multi = list.multi_bets.len(),
                next_refresh_ts = ?st.next_refresh_ts,
                "bets loaded"
            );
            let _ = logger.log(&BetsLoadedEvent {
                ts:              now_iso(),
                event:           "BETS_LOADED",
                single_bets:     list.single_bets.len(),
                multi_bets:      list.multi_bets.len(),
                track_codes:     st.current_bet_search_params.track_codes.clone(),
                next_refresh_ts: st.next_refresh_ts,
            });
        }
        Some(kind) => {
            let reason = match kind {
                BetsErrorKind::NoBets => kind.message().to_string(),
                BetsErrorKind::ResponseError => failure.unwrap_or_default(),
            };
            warn!(kind = kind.as_str(), %reason, "bets load failed");
            let _ = logger.log(&BetsLoadFailedEvent {
                ts:     now_iso(),
                event:  "BETS_LOAD_FAILED",
                kind:   kind.as_str().to_string(),
                reason,
            });
        }
    }
}
