/// FreeBets — datový model
///
/// Bets, races and API payloads as served by the free-bets backend, plus the
/// pure projections the watchers run over them (filtering, post-time
/// ordering, display names).

mod bet;
pub mod filter;
mod params;

pub use bet::{Bet, BetInfo, BetKind, BetTag, MultiBet, Race, RaceEntry, SingleBet};
pub use filter::{
    bet_display_name, bet_type_label, effective_post_time, project, sort_by_effective_post_time,
    FilterState,
};
pub use params::{
    AvailableFilterValues, BetList, BetSearchParams, BetViewResponse, BetsListResponse, DEFAULT_LIMIT,
};
