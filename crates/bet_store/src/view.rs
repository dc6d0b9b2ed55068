/// Single-bet view state, two lanes:
///   foreground: the snapshot the user is looking at
///   background: a silent refresh, compared against foreground until swapped in

use bet_diff::{diff_snapshots, BetDiffDescriptor};
use bet_gateway::FetchError;
use bet_model::{Bet, BetKind, BetViewResponse};
use serde::Serialize;

use crate::error::BetViewErrorKind;
use crate::token::{Applied, RequestLane, RequestToken};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub bet_id:             Option<String>,
    pub loading:            bool,
    pub error:              Option<BetViewErrorKind>,
    pub bet:                Option<Bet>,
    pub next_refresh_ts:    Option<i64>,
    pub loading_background: bool,
    pub bet_background:     Option<Bet>,
    pub error_background:   Option<BetViewErrorKind>,
}

impl ViewState {
    pub fn bet_meta_type(&self) -> Option<BetKind> {
        self.bet.as_ref().map(Bet::kind)
    }

    /// `None` until both snapshots exist.
    pub fn bet_diff(&self) -> Option<BetDiffDescriptor> {
        diff_snapshots(self.bet.as_ref(), self.bet_background.as_ref())
    }

    /// The bet is gone on the backend, in either lane.
    pub fn is_expired(&self) -> bool {
        self.error == Some(BetViewErrorKind::NotFound)
            || self.error_background == Some(BetViewErrorKind::NotFound)
    }

    /// Auto-refresh runs only while a displayed bet has a refresh target
    /// and the background lane is idle and healthy.
    pub fn countdown_enabled(&self) -> bool {
        self.bet.is_some()
            && self.next_refresh_ts.is_some()
            && !self.loading_background
            && self.error_background.is_none()
    }
}

#[derive(Default)]
pub struct BetViewStore {
    state:      ViewState,
    foreground: RequestLane,
    background: RequestLane,
}

impl BetViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Switching to another bet drops both snapshots and makes any fetch
    /// still in flight for the old id stale. Returns whether the id changed.
    pub fn set_bet_id(&mut self, bet_id: impl Into<String>) -> bool {
        let bet_id = bet_id.into();
        if self.state.bet_id.as_deref() == Some(bet_id.as_str()) {
            return false;
        }
        self.foreground.invalidate();
        self.background.invalidate();
        self.state = ViewState {
            bet_id: Some(bet_id),
            ..ViewState::default()
        };
        true
    }

    /// `None` without a bet id.
    pub fn load_bet(&mut self) -> Option<(RequestToken, String)> {
        let id = self.state.bet_id.clone()?;
        self.state.loading = true;
        self.state.error = None;
        Some((self.foreground.issue(), id))
    }

    pub fn load_bet_background(&mut self) -> Option<(RequestToken, String)> {
        let id = self.state.bet_id.clone()?;
        self.state.loading_background = true;
        self.state.error_background = None;
        Some((self.background.issue(), id))
    }

    pub fn apply_bet_result(
        &mut self,
        token: RequestToken,
        result: Result<BetViewResponse, FetchError>,
    ) -> Applied {
        if !self.foreground.is_current(token) {
            return Applied::Stale;
        }

        let st = &mut self.state;
        st.loading = false;
        match result {
            Ok(resp) => {
                st.bet_background = Some(resp.data.clone());
                st.bet = Some(resp.data);
                st.next_refresh_ts = resp.next_refresh_ts;
                st.error = None;
            }
            Err(e) => {
                st.error = Some(BetViewErrorKind::from(&e));
                st.next_refresh_ts = None;
            }
        }
        Applied::Fresh
    }

    pub fn apply_background_result(
        &mut self,
        token: RequestToken,
        result: Result<BetViewResponse, FetchError>,
    ) -> Applied {
        if !self.background.is_current(token) {
            return Applied::Stale;
        }

        let st = &mut self.state;
        st.loading_background = false;
        match result {
            Ok(resp) => {
                st.bet_background = Some(resp.data);
                st.next_refresh_ts = resp.next_refresh_ts;
                st.error_background = None;
            }
            Err(e) => {
                // foreground snapshot stays visible
                st.error_background = Some(BetViewErrorKind::from(&e));
            }
        }
        Applied::Fresh
    }

    /// Promotes the background snapshot; the diff becomes zero.
    pub fn swap_to_foreground(&mut self) {
        let st = &mut self.state;
        if let Some(bg) = &st.bet_background {
            if st.bet.as_ref().map_or(true, |fg| fg.id() == bg.id()) {
                st.bet = Some(bg.clone());
            }
        }
    }
}
