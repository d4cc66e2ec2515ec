//! Channel definitions for streaming subscriptions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical stream a subscriber attaches to
///
/// Unknown tags are kept as `Other` so they can be carried through to the
/// connection URL and rejected when the subscription is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Public market data (order books, prices, trades)
    Market,
    /// Authenticated account data (orders, fills)
    User,
    /// Any other channel tag
    #[serde(untagged)]
    Other(String),
}

impl ChannelKind {
    /// Path segment and `type` tag for this channel
    pub fn as_str(&self) -> &str {
        match self {
            ChannelKind::Market => "market",
            ChannelKind::User => "user",
            ChannelKind::Other(tag) => tag,
        }
    }

    /// Whether the channel requires a credential bundle
    pub fn requires_auth(&self) -> bool {
        matches!(self, ChannelKind::User)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for ChannelKind {
    fn from(s: &str) -> Self {
        match s.trim() {
            "market" => ChannelKind::Market,
            "user" => ChannelKind::User,
            other => ChannelKind::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_channels() {
        assert_eq!(ChannelKind::from("market"), ChannelKind::Market);
        assert_eq!(ChannelKind::from(" user "), ChannelKind::User);
    }

    #[test]
    fn test_unknown_channel_is_preserved() {
        let kind = ChannelKind::from("orders");
        assert_eq!(kind, ChannelKind::Other("orders".to_string()));
        assert_eq!(kind.as_str(), "orders");
        assert!(!kind.requires_auth());
    }

    #[test]
    fn test_channel_serde() {
        assert_eq!(serde_json::to_string(&ChannelKind::Market).unwrap(), "\"market\"");
        let kind: ChannelKind = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(kind, ChannelKind::User);
        let kind: ChannelKind = serde_json::from_str("\"crypto_prices\"").unwrap();
        assert_eq!(kind, ChannelKind::Other("crypto_prices".to_string()));
    }
}
