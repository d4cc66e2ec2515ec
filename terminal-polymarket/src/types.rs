//! Polymarket wire types
//!
//! Outbound subscription frames for the CLOB WebSocket and the subset of the
//! Gamma API event payload needed to resolve asset (token) ids.

use serde::{Deserialize, Serialize};
use terminal_core::{ChannelKind, TerminalError, TerminalResult};
use tracing::warn;

use crate::client::{key_prefix, PolymarketCredentials};

/// Default CLOB WebSocket endpoint (channel path is appended per subscriber)
pub const POLYMARKET_WS_BASE: &str = "wss://ws-subscriptions-clob.polymarket.com";

/// Base URL for Polymarket Gamma API
pub const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

/// Keepalive text frame expected by the CLOB WebSocket
pub const HEARTBEAT_FRAME: &str = "PING";

// ============================================================================
// WebSocket Subscription Frames
// ============================================================================

/// Subscribe message for market channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
}

/// Subscribe message for user channel (authenticated)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSubscribeMessage {
    pub markets: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub auth: AuthObject,
}

/// Auth object for authenticated channels
#[derive(Clone, PartialEq, Serialize)]
pub struct AuthObject {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

impl std::fmt::Debug for AuthObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthObject")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Stand-in for secret values in logged payloads
const MASK: &str = "***";

impl AuthObject {
    /// Copy safe to log: key prefix only, secret and passphrase masked
    pub fn masked(&self) -> Self {
        Self {
            api_key: format!("{}...", key_prefix(&self.api_key)),
            secret: MASK.to_string(),
            passphrase: MASK.to_string(),
        }
    }
}

impl From<&PolymarketCredentials> for AuthObject {
    fn from(creds: &PolymarketCredentials) -> Self {
        Self {
            api_key: creds.api_key.clone(),
            secret: creds.api_secret.clone(),
            passphrase: creds.passphrase.clone(),
        }
    }
}

/// The single handshake frame sent once a channel connection opens
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubscriptionMessage {
    Market(MarketSubscribeMessage),
    User(UserSubscribeMessage),
}

impl SubscriptionMessage {
    /// Build the handshake for a channel
    ///
    /// `data` holds asset ids for the market channel and market (condition)
    /// ids for the user channel. The user channel requires credentials; any
    /// channel other than market/user is rejected.
    pub fn build(
        channel: &ChannelKind,
        data: &[String],
        credentials: Option<&PolymarketCredentials>,
    ) -> TerminalResult<Self> {
        match (channel, credentials) {
            (ChannelKind::Market, _) => Ok(SubscriptionMessage::Market(MarketSubscribeMessage {
                assets_ids: data.to_vec(),
                msg_type: channel.as_str().to_string(),
            })),
            (ChannelKind::User, Some(creds)) => Ok(SubscriptionMessage::User(UserSubscribeMessage {
                markets: data.to_vec(),
                msg_type: channel.as_str().to_string(),
                auth: AuthObject::from(creds),
            })),
            (ChannelKind::User, None) => Err(TerminalError::config(
                "user channel requires an API credential bundle",
            )),
            (ChannelKind::Other(tag), _) => Err(TerminalError::config(format!(
                "invalid channel type: {}",
                tag
            ))),
        }
    }

    /// Copy of the handshake with credentials masked, for logging
    pub fn masked(&self) -> Self {
        match self {
            SubscriptionMessage::Market(msg) => SubscriptionMessage::Market(msg.clone()),
            SubscriptionMessage::User(msg) => SubscriptionMessage::User(UserSubscribeMessage {
                markets: msg.markets.clone(),
                msg_type: msg.msg_type.clone(),
                auth: msg.auth.masked(),
            }),
        }
    }

    /// Serialize to the JSON text frame
    pub fn to_json(&self) -> TerminalResult<String> {
        serde_json::to_string(self)
            .map_err(|e| TerminalError::parse(format!("Failed to encode subscription: {}", e)))
    }
}

// ============================================================================
// Gamma API Types
// ============================================================================

/// A Polymarket market from the Gamma API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolymarketMarket {
    /// Unique identifier
    pub id: String,

    /// Market question
    #[serde(default)]
    pub question: Option<String>,

    /// URL slug
    #[serde(default)]
    pub slug: Option<String>,

    /// Condition ID (used for the user channel)
    #[serde(default)]
    pub condition_id: Option<String>,

    /// CLOB token IDs, encoded by the API as a JSON string array
    #[serde(default)]
    pub clob_token_ids: Option<String>,
}

impl PolymarketMarket {
    /// Parse CLOB token IDs from the JSON string
    pub fn parse_clob_token_ids(&self) -> Option<Vec<String>> {
        let ids_str = self.clob_token_ids.as_ref()?;
        match serde_json::from_str::<Vec<String>>(ids_str) {
            Ok(ids) => Some(ids),
            Err(e) => {
                warn!("Failed to parse clobTokenIds for market {}: {}", self.id, e);
                None
            }
        }
    }
}

/// A Polymarket event (contains multiple markets)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolymarketEvent {
    /// Event ID
    pub id: String,

    /// Event title
    #[serde(default)]
    pub title: Option<String>,

    /// Event slug
    #[serde(default)]
    pub slug: Option<String>,

    /// Associated markets
    #[serde(default)]
    pub markets: Vec<PolymarketMarket>,
}

impl PolymarketEvent {
    /// All CLOB token IDs across the event's markets, de-duplicated in first-seen order
    pub fn clob_token_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self
            .markets
            .iter()
            .filter_map(|m| m.parse_clob_token_ids())
            .flatten()
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Condition IDs of the event's markets
    pub fn condition_ids(&self) -> Vec<String> {
        self.markets
            .iter()
            .filter_map(|m| m.condition_id.clone())
            .collect()
    }
}
