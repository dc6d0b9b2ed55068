use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bet_gateway::BetGateway;
use bet_model::{BetSearchParams, DEFAULT_LIMIT};
use bet_store::ControllerOptions;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost";
pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8091";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?}: {reason}")]
    Invalid {
        var:    &'static str,
        value:  String,
        reason: String,
    },
    #[error("no bet id: set FREEBETS_BET_ID or pass it as the first argument")]
    MissingBetId,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url:        String,
    pub default_params: BetSearchParams,
    pub log_dir:        PathBuf,
    pub http_bind:      SocketAddr,
    pub http_timeout:   Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// `get` resolves a variable name; unset and blank are the same.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = get("FREEBETS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let track_codes: Vec<String> = get("FREEBETS_TRACK_CODES")
            .map(|v| {
                v.split(',')
                    .map(|tc| tc.trim().to_lowercase())
                    .filter(|tc| !tc.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let limit: u32 = parse_or("FREEBETS_LIMIT", get("FREEBETS_LIMIT"), DEFAULT_LIMIT)?;
        if limit == 0 {
            return Err(ConfigError::Invalid {
                var:    "FREEBETS_LIMIT",
                value:  "0".into(),
                reason: "limit must be at least 1".into(),
            });
        }

        let log_dir = get("FREEBETS_LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs"));

        let http_bind: SocketAddr = match get("FREEBETS_HTTP_BIND") {
            Some(v) => parse("FREEBETS_HTTP_BIND", &v)?,
            None    => parse("FREEBETS_HTTP_BIND", DEFAULT_HTTP_BIND)?,
        };

        let timeout_secs: u64 = parse_or("FREEBETS_HTTP_TIMEOUT_SECS", get("FREEBETS_HTTP_TIMEOUT_SECS"), 15)?;

        Ok(Self {
            api_url,
            default_params: BetSearchParams {
                limit,
                track_codes,
                ..BetSearchParams::default()
            },
            log_dir,
            http_bind,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn gateway(&self) -> BetGateway {
        BetGateway::new(&self.api_url, self.http_timeout)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            log_dir: self.log_dir.clone(),
            ..ControllerOptions::default()
        }
    }
}

/// First CLI argument wins over `FREEBETS_BET_ID`.
pub fn bet_id_from<I, F>(args: I, get: F) -> Result<String, ConfigError>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    args.into_iter()
        .next()
        .or_else(|| get("FREEBETS_BET_ID"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingBetId)
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => parse(var, &v),
        None    => Ok(default),
    }
}
