use bet_gateway::FetchError;
use serde::Serialize;

/// Errors surfaced by the bets list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetsErrorKind {
    ResponseError,
    /// The call succeeded but matched nothing
    NoBets,
}

impl BetsErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetsErrorKind::ResponseError => "RESPONSE_ERROR",
            BetsErrorKind::NoBets        => "NO_BETS_ERROR",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            BetsErrorKind::ResponseError => "Unable to load bets, please try again.",
            BetsErrorKind::NoBets        => "No bets match the current filters.",
        }
    }
}

/// Errors surfaced by the single-bet view, per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetViewErrorKind {
    ResponseError,
    /// 404, the bet has expired
    NotFound,
}

impl BetViewErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetViewErrorKind::ResponseError => "RESPONSE_ERROR",
            BetViewErrorKind::NotFound      => "NOT_FOUND_ERROR",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            BetViewErrorKind::ResponseError => "Unable to load bet, please try again.",
            BetViewErrorKind::NotFound      => "This bet has expired. Go home to get a fresh one.",
        }
    }
}

impl From<&FetchError> for BetViewErrorKind {
    fn from(e: &FetchError) -> Self {
        if e.is_not_found() {
            BetViewErrorKind::NotFound
        } else {
            BetViewErrorKind::ResponseError
        }
    }
}
