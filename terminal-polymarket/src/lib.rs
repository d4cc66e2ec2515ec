//! Polymarket streaming integration for the Prediction Market Terminal
//!
//! This crate provides a channel subscriber for the Polymarket CLOB
//! WebSocket (market and user channels) and a small Gamma API client used to
//! resolve event slugs into asset ids.
//!
//! The user channel needs credentials. They can be loaded with
//! [`PolymarketCredentials::from_env`], which reads:
//! - `POLY_API_KEY` - Your Polymarket API key
//! - `POLY_SECRET` - Your Polymarket API secret
//! - `POLY_PASSPHRASE` - Your Polymarket API passphrase

pub mod client;
pub mod heartbeat;
pub mod types;
pub mod websocket;

pub use client::{PolymarketClient, PolymarketCredentials};
pub use heartbeat::{Heartbeat, PING_INTERVAL};
pub use types::{
    AuthObject, MarketSubscribeMessage, PolymarketEvent, PolymarketMarket, SubscriptionMessage,
    UserSubscribeMessage, HEARTBEAT_FRAME, POLYMARKET_WS_BASE,
};
pub use websocket::{ChannelSubscriber, MessageHandler, PrintHandler};
