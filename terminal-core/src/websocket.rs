//! Lifecycle types for streaming subscriptions
//!
//! A subscriber moves through `Created -> Connecting -> Open` and ends in
//! either `Closed` or `Failed`. There is no edge back to `Connecting`.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a channel subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Constructed, no connection attempted yet
    Created,
    /// Transport handshake in progress
    Connecting,
    /// Subscribed and heartbeating
    Open,
    /// Ended without error (remote close, stream end or cancellation)
    Closed,
    /// Ended with a configuration or transport error
    Failed,
}

impl SubscriberState {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriberState::Closed | SubscriberState::Failed)
    }

    fn as_u8(self) -> u8 {
        match self {
            SubscriberState::Created => 0,
            SubscriberState::Connecting => 1,
            SubscriberState::Open => 2,
            SubscriberState::Closed => 3,
            SubscriberState::Failed => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => SubscriberState::Created,
            1 => SubscriberState::Connecting,
            2 => SubscriberState::Open,
            3 => SubscriberState::Closed,
            _ => SubscriberState::Failed,
        }
    }
}

/// Non-error outcome of running a subscriber to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberExit {
    /// The remote side sent a close frame
    ClosedByRemote {
        code: Option<u16>,
        reason: String,
    },
    /// The transport ended without a close frame
    StreamEnded,
    /// The owner cancelled the subscriber
    Cancelled,
}

impl fmt::Display for SubscriberExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberExit::ClosedByRemote { code: Some(code), reason } if !reason.is_empty() => {
                write!(f, "closed by remote ({}): {}", code, reason)
            }
            SubscriberExit::ClosedByRemote { code: Some(code), .. } => {
                write!(f, "closed by remote ({})", code)
            }
            SubscriberExit::ClosedByRemote { code: None, .. } => write!(f, "closed by remote"),
            SubscriberExit::StreamEnded => write!(f, "stream ended"),
            SubscriberExit::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Shared, lock-free view of a subscriber's state
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(state: SubscriberState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub fn get(&self) -> SubscriberState {
        SubscriberState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: SubscriberState) {
        self.0.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Move from `from` to `to`; returns false if the current state is not `from`
    pub fn transition(&self, from: SubscriberState, to: SubscriberState) -> bool {
        self.0
            .compare_exchange(
                from.as_u8(),
                to.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_cell_roundtrip() {
        let cell = StateCell::new(SubscriberState::Created);
        for state in [
            SubscriberState::Connecting,
            SubscriberState::Open,
            SubscriberState::Closed,
            SubscriberState::Failed,
        ] {
            cell.set(state);
            assert_eq!(cell.get(), state);
        }
    }

    #[test]
    fn test_state_cell_transition() {
        let cell = StateCell::new(SubscriberState::Created);
        assert!(cell.transition(SubscriberState::Created, SubscriberState::Connecting));
        assert!(!cell.transition(SubscriberState::Created, SubscriberState::Connecting));
        assert_eq!(cell.get(), SubscriberState::Connecting);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SubscriberState::Open.is_terminal());
        assert!(SubscriberState::Closed.is_terminal());
        assert!(SubscriberState::Failed.is_terminal());
    }

    #[test]
    fn test_exit_display() {
        let exit = SubscriberExit::ClosedByRemote {
            code: Some(1000),
            reason: "bye".to_string(),
        };
        assert_eq!(exit.to_string(), "closed by remote (1000): bye");
        assert_eq!(SubscriberExit::Cancelled.to_string(), "cancelled");
    }
}
