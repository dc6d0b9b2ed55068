/// Bets index state machine.
///
///   Idle ─load─▶ Loading ─▶ Loaded | NoBets | ResponseError
///
/// Only the result of the latest request may write the state.

use bet_gateway::FetchError;
use bet_model::{
    project, sort_by_effective_post_time, AvailableFilterValues, Bet, BetList, BetSearchParams,
    BetsListResponse, FilterState,
};
use serde::Serialize;

use crate::error::BetsErrorKind;
use crate::token::{Applied, RequestLane, RequestToken};

/// Observable snapshot of the bets index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexState {
    pub current_bet_list:          BetList,
    pub loading:                   bool,
    pub error:                     Option<BetsErrorKind>,
    pub available_filter_values:   AvailableFilterValues,
    pub current_bet_search_params: BetSearchParams,
    pub next_refresh_ts:           Option<i64>,
    pub countdown_refresh_enabled: bool,
}

impl IndexState {
    /// Bets matching `filter`, ordered by effective post time.
    pub fn visible_bets(&self, filter: &FilterState) -> Vec<Bet> {
        let all = self.current_bet_list.to_bets();
        let mut shown = project(&all, filter);
        sort_by_effective_post_time(&mut shown);
        shown.into_iter().cloned().collect()
    }

    /// Visible bets under the active search params.
    pub fn visible_bets_for_params(&self) -> Vec<Bet> {
        self.visible_bets(&FilterState::from_params(&self.current_bet_search_params))
    }
}

pub struct BetIndexStore {
    state:           IndexState,
    default_params:  BetSearchParams,
    lane:            RequestLane,
}

impl BetIndexStore {
    /// `default_params` seed the first query and are restored on NoBets.
    pub fn new(default_params: BetSearchParams) -> Self {
        Self {
            state: IndexState {
                current_bet_search_params: default_params.clone(),
                ..IndexState::default()
            },
            default_params,
            lane: RequestLane::default(),
        }
    }

    pub fn state(&self) -> &IndexState {
        &self.state
    }

    /// Starts a load with the current params. Returns the token the result
    /// must carry and the params to fetch with.
    pub fn load_bets(&mut self) -> (RequestToken, BetSearchParams) {
        self.state.loading = true;
        self.state.error = None;
        self.state.countdown_refresh_enabled = false;
        (self.lane.issue(), self.state.current_bet_search_params.clone())
    }

    pub fn set_bet_search_params(&mut self, params: BetSearchParams) -> (RequestToken, BetSearchParams) {
        self.state.current_bet_search_params = params;
        self.load_bets()
    }

    pub fn set_countdown_refresh_enabled(&mut self, enabled: bool) {
        self.state.countdown_refresh_enabled = enabled;
    }

    pub fn apply_bets_result(
        &mut self,
        token: RequestToken,
        result: Result<BetsListResponse, FetchError>,
    ) -> Applied {
        if !self.lane.is_current(token) {
            return Applied::Stale;
        }

        let st = &mut self.state;
        st.loading = false;

        match result {
            Ok(resp) if !resp.is_empty() => {
                // echoed filters plus any track the user has not seen before
                let mut track_codes: Vec<String> = Vec::new();
                let unseen = resp.all_track_codes.iter()
                    .filter(|tc| !st.available_filter_values.track_codes.contains(tc));
                for tc in resp.track_codes.iter().chain(unseen) {
                    if !track_codes.contains(tc) {
                        track_codes.push(tc.clone());
                    }
                }

                st.current_bet_search_params = BetSearchParams {
                    bet_types:       Some(resp.bet_types),
                    bet_strat_types: Some(resp.bet_strat_types),
                    skip:            resp.skip,
                    limit:           resp.limit,
                    track_codes,
                };
                st.available_filter_values = AvailableFilterValues {
                    track_codes:     resp.all_track_codes,
                    bet_types:       resp.all_bet_types,
                    bet_strat_types: resp.all_bet_strat_types,
                };
                st.current_bet_list = BetList {
                    single_bets: resp.single_bets,
                    multi_bets:  resp.multi_bets,
                };
                st.next_refresh_ts = resp.next_refresh_ts;
                st.countdown_refresh_enabled = true;
                st.error = None;
            }
            Ok(_) => {
                st.error = Some(BetsErrorKind::NoBets);
                st.current_bet_list = BetList::default();
                st.next_refresh_ts = None;
                st.countdown_refresh_enabled = false;
                st.current_bet_search_params = self.default_params.clone();
            }
            Err(_) => {
                // params stay, so a retry repeats the same query
                st.error = Some(BetsErrorKind::ResponseError);
                st.next_refresh_ts = None;
                st.countdown_refresh_enabled = false;
            }
        }

        Applied::Fresh
    }
}
