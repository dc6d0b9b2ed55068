use serde::{Deserialize, Serialize};

use crate::bet::{Bet, BetKind, MultiBet, SingleBet};

pub const DEFAULT_LIMIT: u32 = 2000;

// ── Search params ────────────────────────────────────────────────────────────

/// The active list query. `None` type filters are omitted from the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetSearchParams {
    pub bet_types:       Option<Vec<String>>,
    pub bet_strat_types: Option<Vec<String>>,
    pub skip:            u32,
    pub limit:           u32,
    pub track_codes:     Vec<String>,
}

impl Default for BetSearchParams {
    fn default() -> Self {
        Self {
            bet_types:       None,
            bet_strat_types: None,
            skip:            0,
            limit:           DEFAULT_LIMIT,
            track_codes:     Vec::new(),
        }
    }
}

impl BetSearchParams {
    pub fn with_track_codes(track_codes: Vec<String>) -> Self {
        Self { track_codes, ..Self::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableFilterValues {
    pub track_codes:     Vec<String>,
    pub bet_types:       Vec<String>,
    pub bet_strat_types: Vec<String>,
}

// ── /api/v1/bets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetsListResponse {
    #[serde(default)]
    pub single_bets:         Vec<SingleBet>,
    #[serde(default)]
    pub multi_bets:          Vec<MultiBet>,
    pub skip:                u32,
    pub limit:               u32,
    #[serde(default)]
    pub track_codes:         Vec<String>,
    #[serde(default)]
    pub bet_types:           Vec<String>,
    #[serde(default)]
    pub bet_strat_types:     Vec<String>,
    #[serde(default)]
    pub all_track_codes:     Vec<String>,
    #[serde(default)]
    pub all_bet_types:       Vec<String>,
    #[serde(default)]
    pub all_bet_strat_types: Vec<String>,
    pub next_refresh_ts:     Option<i64>,
}

impl BetsListResponse {
    /// A nominally successful call may carry no bets at all.
    pub fn is_empty(&self) -> bool {
        self.single_bets.is_empty() && self.multi_bets.is_empty()
    }

    pub fn bet_count(&self) -> usize {
        self.single_bets.len() + self.multi_bets.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BetList {
    pub single_bets: Vec<SingleBet>,
    pub multi_bets:  Vec<MultiBet>,
}

impl BetList {
    pub fn is_empty(&self) -> bool {
        self.single_bets.is_empty() && self.multi_bets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.single_bets.len() + self.multi_bets.len()
    }

    /// Singles first, then multis.
    pub fn to_bets(&self) -> Vec<Bet> {
        self.single_bets.iter().cloned().map(Bet::Single)
            .chain(self.multi_bets.iter().cloned().map(Bet::Multi))
            .collect()
    }
}

// ── /api/v1/bets/{id} ────────────────────────────────────────────────────────

/// Single-bet response. The payload variant is picked by `result_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBetViewResponse")]
pub struct BetViewResponse {
    pub data:            Bet,
    pub next_refresh_ts: Option<i64>,
}

#[derive(Deserialize)]
struct RawBetViewResponse {
    data:            serde_json::Value,
    result_type:     BetKind,
    #[serde(default)]
    next_refresh_ts: Option<i64>,
}

impl TryFrom<RawBetViewResponse> for BetViewResponse {
    type Error = serde_json::Error;

    fn try_from(raw: RawBetViewResponse) -> Result<Self, Self::Error> {
        let data = match raw.result_type {
            BetKind::Single => Bet::Single(serde_json::from_value(raw.data)?),
            BetKind::Multi  => Bet::Multi(serde_json::from_value(raw.data)?),
        };
        Ok(Self { data, next_refresh_ts: raw.next_refresh_ts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn race(track: &str) -> serde_json::Value {
        json!({
            "track_code": track, "race_number": 1, "race_date": "2021-11-06",
            "mtp": 5, "status": "open", "post_time": null, "post_time_stamp": 1000,
            "win_pool_total": 0.0, "place_pool_total": 0.0, "show_pool_total": 0.0
        })
    }

    fn info(id: i64) -> serde_json::Value {
        json!({
            "id": id, "title": "", "description": "", "predicted_odds": 1.5,
            "min_reward": 1.0, "avg_reward": 1.5, "max_reward": 2.0, "cost": 1.0,
            "bet_type": "BetType.BOX_WIN_ARB",
            "bet_strategy_type": "BetStrategyType.BOOK_BOX_WIN_ARB", "tags": []
        })
    }

    #[test]
    fn view_response_uses_result_type_discriminant() {
        let mut multi = info(4);
        let mut sub = info(5);
        sub["race"] = race("kee");
        multi["sub_bets"] = json!([sub]);

        let resp: BetViewResponse = serde_json::from_value(json!({
            "data": multi, "result_type": "multi", "next_refresh_ts": 42
        })).unwrap();

        assert_eq!(resp.data.kind(), BetKind::Multi);
        assert_eq!(resp.next_refresh_ts, Some(42));
    }

    #[test]
    fn view_response_rejects_payload_not_matching_kind() {
        // no race → cannot be a single bet, even though result_type says so
        let res = serde_json::from_value::<BetViewResponse>(json!({
            "data": info(4), "result_type": "single", "next_refresh_ts": 1
        }));
        assert!(res.is_err());
    }

    #[test]
    fn empty_list_response_is_detected() {
        let resp: BetsListResponse = serde_json::from_value(json!({
            "single_bets": [], "multi_bets": [], "skip": 0, "limit": 2000,
            "track_codes": [], "bet_types": [], "bet_strat_types": [],
            "all_track_codes": ["kee"], "all_bet_types": [], "all_bet_strat_types": [],
            "next_refresh_ts": null
        })).unwrap();
        assert!(resp.is_empty());
        assert_eq!(resp.bet_count(), 0);
    }

    #[test]
    fn default_params_match_dashboard_defaults() {
        let p = BetSearchParams::default();
        assert_eq!(p.limit, 2000);
        assert_eq!(p.skip, 0);
        assert!(p.bet_types.is_none());
        assert!(p.track_codes.is_empty());
    }
}
