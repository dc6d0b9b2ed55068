use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Race as reported with a single bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub track_code:       String,
    pub race_number:      i64,
    pub race_date:        String,
    pub mtp:              i64,            // minutes to post
    pub status:           String,
    pub post_time:        Option<String>,
    pub post_time_stamp:  Option<i64>,    // epoch millis
    pub win_pool_total:   f64,
    pub place_pool_total: f64,
    pub show_pool_total:  f64,
}

impl Race {
    pub fn post_time_utc(&self) -> Option<DateTime<Utc>> {
        self.post_time_stamp
            .and_then(|ts| Utc.timestamp_millis_opt(ts).single())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceEntry {
    pub program_no:        String,
    pub name:              String,
    pub odds:              Option<f64>,
    pub odds_source:       Option<String>,
    pub ai_predicted_odds: Option<f64>,
    pub owner_name:        Option<String>,
    pub jockey_name:       Option<String>,
    pub trainer_name:      Option<String>,
    pub sire_name:         Option<String>,
    pub dam_name:          Option<String>,
    pub win_pool_total:    f64,
    pub place_pool_total:  f64,
    pub show_pool_total:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetTag {
    #[serde(default)]
    pub id:          i64,
    pub name:        String,
    #[serde(default)]
    pub description: String,
}

/// Fields shared by single and multi bets.
///
/// On a multi bet the reward/cost fields are backend aggregates and are not
/// derivable from the sub-bets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetInfo {
    pub id:                i64,
    #[serde(default)]
    pub title:             String,
    #[serde(default)]
    pub description:       String,
    pub predicted_odds:    f64,
    pub min_reward:        f64,
    pub avg_reward:        f64,
    pub max_reward:        f64,
    pub cost:              f64,
    pub bet_type:          String,   // e.g. "BetType.WIN_BET"
    pub bet_strategy_type: String,   // e.g. "BetStrategyType.BOOK_WIN_BET"
    #[serde(default)]
    pub tags:              Vec<BetTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleBet {
    #[serde(flatten)]
    pub info: BetInfo,
    pub race: Race,
    #[serde(default)]
    pub active_entries:   Vec<RaceEntry>,
    #[serde(default)]
    pub inactive_entries: Vec<RaceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBet {
    #[serde(flatten)]
    pub info:     BetInfo,
    pub sub_bets: Vec<SingleBet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetKind {
    Single,
    Multi,
}

impl BetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetKind::Single => "single",
            BetKind::Multi  => "multi",
        }
    }
}

/// A bet with an explicit discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Bet {
    Single(SingleBet),
    Multi(MultiBet),
}

impl Bet {
    pub fn info(&self) -> &BetInfo {
        match self {
            Bet::Single(b) => &b.info,
            Bet::Multi(b)  => &b.info,
        }
    }

    pub fn id(&self) -> i64 {
        self.info().id
    }

    pub fn kind(&self) -> BetKind {
        match self {
            Bet::Single(_) => BetKind::Single,
            Bet::Multi(_)  => BetKind::Multi,
        }
    }

    /// Track codes of every race the bet touches, in backend order.
    pub fn track_codes(&self) -> Vec<&str> {
        match self {
            Bet::Single(b) => vec![b.race.track_code.as_str()],
            Bet::Multi(b)  => b.sub_bets.iter().map(|s| s.race.track_code.as_str()).collect(),
        }
    }
}

impl From<SingleBet> for Bet {
    fn from(b: SingleBet) -> Self {
        Bet::Single(b)
    }
}

impl From<MultiBet> for Bet {
    fn from(b: MultiBet) -> Self {
        Bet::Multi(b)
    }
}
