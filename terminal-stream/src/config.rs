//! Streaming client configuration
//!
//! Read from the process environment (after `.env.local` has been loaded).

use std::time::Duration;

use terminal_core::{ChannelKind, TerminalError};
use terminal_polymarket::{PolymarketCredentials, PING_INTERVAL, POLYMARKET_WS_BASE};

/// Configuration for the streaming client
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket endpoint base; `/ws/<channel>` is appended per channel
    pub endpoint: String,
    /// Channels to run, each on its own connection
    pub channels: Vec<ChannelKind>,
    /// Asset (token) ids for the market channel
    pub asset_ids: Vec<String>,
    /// Event slug to resolve asset ids from when none are configured
    pub event_slug: Option<String>,
    /// Market (condition) ids for the user channel
    pub user_markets: Vec<String>,
    pub credentials: Option<PolymarketCredentials>,
    pub verbose: bool,
    pub ping_interval: Duration,
}

impl StreamConfig {
    /// Load configuration from environment variables
    ///
    /// Recognised variables:
    /// - POLY_WS_URL: endpoint base (default: Polymarket CLOB WebSocket)
    /// - POLY_CHANNELS: comma-separated channels (default: `market`)
    /// - POLY_ASSET_IDS: comma-separated asset ids
    /// - POLY_EVENT_SLUG: event slug used when POLY_ASSET_IDS is empty
    /// - POLY_USER_MARKETS: comma-separated market ids for the user channel
    /// - POLY_API_KEY / POLY_SECRET / POLY_PASSPHRASE: user channel credentials
    /// - POLY_WS_VERBOSE: `1`/`true`/`yes` or `0`/`false`/`no` (default: true)
    /// - POLY_PING_INTERVAL_SECS: heartbeat interval (default: 10)
    pub fn from_env() -> Result<Self, TerminalError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TerminalError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let endpoint = get("POLY_WS_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| POLYMARKET_WS_BASE.to_string());

        let channels: Vec<ChannelKind> = get("POLY_CHANNELS")
            .map(|v| split_list(&v).iter().map(|c| ChannelKind::from(c.as_str())).collect())
            .unwrap_or_else(|| vec![ChannelKind::Market]);
        if channels.is_empty() {
            return Err(TerminalError::config("POLY_CHANNELS cannot be empty"));
        }

        let credentials = match (get("POLY_API_KEY"), get("POLY_SECRET"), get("POLY_PASSPHRASE")) {
            (Some(key), Some(secret), Some(passphrase)) => {
                Some(PolymarketCredentials::new(key, secret, passphrase))
            }
            _ => None,
        };

        let verbose = match get("POLY_WS_VERBOSE") {
            Some(v) => parse_bool("POLY_WS_VERBOSE", &v)?,
            None => true,
        };

        let ping_interval = match get("POLY_PING_INTERVAL_SECS") {
            Some(v) => {
                let secs: u64 = v.parse().map_err(|e| {
                    TerminalError::config(format!("Invalid POLY_PING_INTERVAL_SECS '{}': {}", v, e))
                })?;
                if secs == 0 {
                    return Err(TerminalError::config("POLY_PING_INTERVAL_SECS must be positive"));
                }
                Duration::from_secs(secs)
            }
            None => PING_INTERVAL,
        };

        Ok(Self {
            endpoint,
            channels,
            asset_ids: get("POLY_ASSET_IDS").map(|v| split_list(&v)).unwrap_or_default(),
            event_slug: get("POLY_EVENT_SLUG"),
            user_markets: get("POLY_USER_MARKETS").map(|v| split_list(&v)).unwrap_or_default(),
            credentials,
            verbose,
            ping_interval,
        })
    }

    /// Subscription data for a channel
    pub fn subscription_data(&self, channel: &ChannelKind, asset_ids: &[String]) -> Vec<String> {
        match channel {
            ChannelKind::User => self.user_markets.clone(),
            _ => asset_ids.to_vec(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(field: &str, value: &str) -> Result<bool, TerminalError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TerminalError::config(format!(
            "Invalid {} '{}': expected true or false",
            field, value
        ))),
    }
}
