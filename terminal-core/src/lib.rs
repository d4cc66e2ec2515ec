//! Core types for the Prediction Market Terminal streaming client
//!
//! This crate defines the shared data structures used across the terminal:
//! channel kinds, subscriber lifecycle states and the error taxonomy.

pub mod channel;
pub mod error;
pub mod websocket;

pub use channel::ChannelKind;
pub use error::{TerminalError, TerminalResult};
pub use websocket::{StateCell, SubscriberExit, SubscriberState};
