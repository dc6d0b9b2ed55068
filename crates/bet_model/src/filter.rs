/// Filter projection + post-time ordering over a fetched bet set.

use serde::{Deserialize, Serialize};

use crate::bet::Bet;
use crate::params::BetSearchParams;

/// User-chosen filter values. An empty list does not restrict its axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub track_codes:     Vec<String>,
    pub bet_types:       Vec<String>,
    pub bet_strat_types: Vec<String>,
}

impl FilterState {
    pub fn from_params(params: &BetSearchParams) -> Self {
        Self {
            track_codes:     params.track_codes.clone(),
            bet_types:       params.bet_types.clone().unwrap_or_default(),
            bet_strat_types: params.bet_strat_types.clone().unwrap_or_default(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.track_codes.is_empty() && self.bet_types.is_empty() && self.bet_strat_types.is_empty()
    }

    pub fn matches(&self, bet: &Bet) -> bool {
        let info = bet.info();

        if !self.track_codes.is_empty() {
            let hit = bet.track_codes().iter().any(|tc| {
                self.track_codes.iter().any(|f| f.eq_ignore_ascii_case(tc))
            });
            if !hit {
                return false;
            }
        }

        if !self.bet_types.is_empty() && !self.bet_types.contains(&info.bet_type) {
            return false;
        }

        if !self.bet_strat_types.is_empty() && !self.bet_strat_types.contains(&info.bet_strategy_type) {
            return false;
        }

        true
    }
}

/// Keeps input order.
pub fn project<'a, I>(bets: I, filter: &FilterState) -> Vec<&'a Bet>
where
    I: IntoIterator<Item = &'a Bet>,
{
    bets.into_iter().filter(|b| filter.matches(b)).collect()
}

/// Post time used for ordering: the race post time of a single bet, the
/// earliest known sub-bet post time of a multi bet, 0 when unknown.
pub fn effective_post_time(bet: &Bet) -> i64 {
    match bet {
        Bet::Single(b) => b.race.post_time_stamp.unwrap_or(0),
        Bet::Multi(b)  => b.sub_bets.iter()
            .filter_map(|s| s.race.post_time_stamp)
            .filter(|ts| *ts != 0)
            .min()
            .unwrap_or(0),
    }
}

/// Stable, ascending.
pub fn sort_by_effective_post_time(bets: &mut [&Bet]) {
    bets.sort_by_key(|b| effective_post_time(b));
}

/// `KEE` for a single bet, `(MULTI) KEE | CD` for a multi bet.
pub fn bet_display_name(bet: &Bet) -> String {
    match bet {
        Bet::Single(b) => b.race.track_code.to_uppercase(),
        Bet::Multi(_)  => {
            let mut uniq: Vec<String> = Vec::new();
            for tc in bet.track_codes() {
                let up = tc.to_uppercase();
                if !uniq.contains(&up) {
                    uniq.push(up);
                }
            }
            format!("(MULTI) {}", uniq.join(" | "))
        }
    }
}

pub fn bet_type_label(bet_type: &str) -> String {
    match bet_type {
        "BetType.ALL_WIN_ARB"    => "All Win".to_string(),
        "BetType.BOX_WIN_ARB"    => "(Multi) Box Win".to_string(),
        "BetType.WIN_BET"        => "Win".to_string(),
        "BetType.PLACE_BET"      => "Place".to_string(),
        "BetType.SHOW_BET"       => "Show".to_string(),
        "BetType.PLACE_SHOW_ARB" => "Place/Show".to_string(),
        other => other.strip_prefix("BetType.").unwrap_or(other).to_string(),
    }
}
