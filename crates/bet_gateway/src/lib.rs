/// FreeBets — Bet Fetch Gateway
///
/// Dva endpointy backendu:
///   A) GET /api/v1/bets?bet_types=..&bet_strat_types=..&skip=..&limit=..&track_codes=..
///   B) GET /api/v1/bets/{id}   (404 = bet expired)
///
/// Only the network call; no state, no retries.

use bet_model::{BetSearchParams, BetViewResponse, BetsListResponse};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(feature = "testkit")]
pub mod testkit;

pub const BETS_PATH: &str = "/api/v1/bets";

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Single-bet fetch answered 404, the bet no longer exists
    #[error("bet not found")]
    NotFound,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound)
    }
}

// ── Query encoding ───────────────────────────────────────────────────────────

fn encode_list(values: &[String]) -> String {
    values.iter()
        .map(|v| urlencoding::encode(v).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Builds the list query string (without `?`).
///
/// Keys keep a fixed order; absent type filters and an empty track list are
/// left out entirely instead of being sent empty.
pub fn build_list_query(params: &BetSearchParams) -> Result<String, FetchError> {
    if params.limit == 0 {
        return Err(FetchError::InvalidQuery("limit must be > 0".to_string()));
    }

    let mut tokens: Vec<String> = Vec::with_capacity(5);

    if let Some(types) = &params.bet_types {
        tokens.push(format!("bet_types={}", encode_list(types)));
    }
    if let Some(strats) = &params.bet_strat_types {
        tokens.push(format!("bet_strat_types={}", encode_list(strats)));
    }
    tokens.push(format!("skip={}", params.skip));
    tokens.push(format!("limit={}", params.limit));
    if !params.track_codes.is_empty() {
        tokens.push(format!("track_codes={}", encode_list(&params.track_codes)));
    }

    Ok(tokens.join("&"))
}

// ── BetGateway ───────────────────────────────────────────────────────────────

pub struct BetGateway {
    client:   reqwest::Client,
    base_url: String,
}

impl BetGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent("FreeBetsLive/1.0")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list_url(&self, params: &BetSearchParams) -> Result<String, FetchError> {
        Ok(format!("{}{}?{}", self.base_url, BETS_PATH, build_list_query(params)?))
    }

    pub fn bet_url(&self, bet_id: &str) -> String {
        format!("{}{}/{}", self.base_url, BETS_PATH, urlencoding::encode(bet_id))
    }

    /// An empty result is still `Ok`; see [`BetsListResponse::is_empty`].
    pub async fn fetch_bet_list(&self, params: &BetSearchParams) -> Result<BetsListResponse, FetchError> {
        let url = self.list_url(params)?;
        let resp: BetsListResponse = self.get_json(&url).await?;
        debug!(
            bets = resp.bet_count(),
            next_refresh_ts = ?resp.next_refresh_ts,
            "bets list fetched"
        );
        Ok(resp)
    }

    pub async fn fetch_bet(&self, bet_id: &str) -> Result<BetViewResponse, FetchError> {
        let url = self.bet_url(bet_id);
        match self.get_json::<BetViewResponse>(&url).await {
            Err(FetchError::Status(404)) => Err(FetchError::NotFound),
            other => other,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let resp = self.client.get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!("bets API request failed: {}", e);
                FetchError::Transport(e.to_string())
            })?;

        let status = resp.status();
        let raw = resp.text().await
            .map_err(|e| FetchError::Transport(format!("body read failed: {e}")))?;

        if !status.is_success() {
            warn!("bets API status {}: {}", status, preview(&raw));
            return Err(FetchError::Status(status.as_u16()));
        }

        serde_json::from_str(&raw).map_err(|e| {
            warn!("bets API JSON parse failed: {} (first 200: {})", e, preview(&raw));
            FetchError::Decode(e.to_string())
        })
    }
}

/// First 200 chars of a body for log lines; never splits a UTF-8 char.
fn preview(raw: &str) -> &str {
    match raw.char_indices().nth(200) {
        Some((end, _)) => &raw[..end],
        None           => raw,
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundary() {
        let body = format!("{}é tail", "x".repeat(199));
        let p = preview(&body);
        assert_eq!(p.chars().count(), 200);
        assert!(p.ends_with('é'));
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"ž".repeat(300)).chars().count(), 200);
    }

    #[test]
    fn absent_filters_are_omitted() {
        let q = build_list_query(&BetSearchParams::default()).unwrap();
        assert_eq!(q, "skip=0&limit=2000");
    }

    #[test]
    fn list_values_are_encoded_then_comma_joined() {
        let params = BetSearchParams {
            bet_types:       Some(vec!["BetType.WIN_BET".into(), "a b".into()]),
            bet_strat_types: Some(vec!["x/y".into()]),
            skip:            10,
            limit:           50,
            track_codes:     vec!["kee".into(), "cd".into()],
        };
        let q = build_list_query(&params).unwrap();
        assert_eq!(
            q,
            "bet_types=BetType.WIN_BET,a%20b&bet_strat_types=x%2Fy&skip=10&limit=50&track_codes=kee,cd"
        );
    }

    #[test]
    fn empty_type_list_is_sent_but_none_is_not() {
        let params = BetSearchParams { bet_types: Some(vec![]), ..Default::default() };
        assert_eq!(build_list_query(&params).unwrap(), "bet_types=&skip=0&limit=2000");
    }

    #[test]
    fn zero_limit_is_rejected() {
        let params = BetSearchParams { limit: 0, ..Default::default() };
        assert!(matches!(build_list_query(&params), Err(FetchError::InvalidQuery(_))));
    }

    #[test]
    fn base_url_gets_scheme_and_loses_trailing_slash() {
        let gw = BetGateway::new("api.example:8000/", Duration::from_secs(1));
        assert_eq!(gw.base_url(), "http://api.example:8000");
        assert_eq!(gw.bet_url("17"), "http://api.example:8000/api/v1/bets/17");
    }
}
