//! Polymarket API client
//!
//! Holds the API credential bundle used by the user channel and a small
//! Gamma API client for resolving an event slug into asset (token) ids.

use crate::types::{PolymarketEvent, GAMMA_API_BASE};
use reqwest::Client;
use std::time::Duration;
use terminal_core::TerminalError;
use tracing::{debug, instrument};

/// API credentials for the authenticated user channel
///
/// Values are forwarded verbatim in the subscription handshake and never
/// validated locally.
#[derive(Clone)]
pub struct PolymarketCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl PolymarketCredentials {
    /// Create new credentials
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }

    /// Create credentials from environment variables
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("POLY_API_KEY").ok()?;
        let api_secret = std::env::var("POLY_SECRET").ok()?;
        let passphrase = std::env::var("POLY_PASSPHRASE").ok()?;

        Some(Self {
            api_key,
            api_secret,
            passphrase,
        })
    }

    /// Short, log-safe prefix of the API key
    pub fn key_hint(&self) -> &str {
        key_prefix(&self.api_key)
    }
}

impl std::fmt::Debug for PolymarketCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolymarketCredentials")
            .field("api_key", &format!("{}...", self.key_hint()))
            .finish_non_exhaustive()
    }
}

/// First 8 characters of an API key
pub(crate) fn key_prefix(api_key: &str) -> &str {
    let end = api_key
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(api_key.len());
    &api_key[..end]
}

/// Polymarket Gamma API client
#[derive(Clone, Debug)]
pub struct PolymarketClient {
    client: Client,
    base_url: String,
}

impl PolymarketClient {
    /// Create a new client against the public Gamma API
    pub fn new() -> Result<Self, TerminalError> {
        Self::with_base_url(GAMMA_API_BASE)
    }

    /// Create a client against a different Gamma API host
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, TerminalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TerminalError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get an event by slug
    #[instrument(skip(self))]
    pub async fn get_event(&self, slug: &str) -> Result<PolymarketEvent, TerminalError> {
        let url = format!("{}/events", self.base_url);

        debug!("Fetching Polymarket event: {}", slug);

        let response = self
            .client
            .get(&url)
            .query(&[("slug", slug)])
            .send()
            .await
            .map_err(|e| TerminalError::network(format!("Failed to fetch event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TerminalError::api(format!(
                "Polymarket API error ({}): {}",
                status, body
            )));
        }

        let events: Vec<PolymarketEvent> = response
            .json()
            .await
            .map_err(|e| TerminalError::parse(format!("Failed to parse event response: {}", e)))?;

        events
            .into_iter()
            .next()
            .ok_or_else(|| TerminalError::not_found(format!("Event not found: {}", slug)))
    }

    /// Resolve an event slug into the CLOB token ids of all its markets
    pub async fn resolve_asset_ids(&self, slug: &str) -> Result<Vec<String>, TerminalError> {
        let event = self.get_event(slug).await?;
        let ids = event.clob_token_ids();
        debug!("Resolved {} asset ids for event {}", ids.len(), slug);
        Ok(ids)
    }
}
