//! Keepalive task for an open channel connection
//!
//! Emits the `PING` text frame immediately and then once per interval through
//! the connection's outbound queue. The task stops when its token is
//! cancelled or when the queue is gone (the connection is no longer writable).

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::types::HEARTBEAT_FRAME;

/// Ping interval (Polymarket expects pings every 10s)
pub const PING_INTERVAL: Duration = Duration::from_secs(10);

/// Periodic `PING` emitter bound to one connection
#[derive(Debug)]
pub struct Heartbeat {
    period: Duration,
    outbound: mpsc::Sender<Message>,
    cancel: CancellationToken,
    label: String,
}

impl Heartbeat {
    pub fn new(
        period: Duration,
        outbound: mpsc::Sender<Message>,
        cancel: CancellationToken,
        label: impl Into<String>,
    ) -> Self {
        Self {
            period,
            outbound,
            cancel,
            label: label.into(),
        }
    }

    /// Run on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Emit pings until cancelled or the connection stops accepting frames
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("{} Heartbeat cancelled", self.label);
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.outbound.send(Message::Text(HEARTBEAT_FRAME.into())).await {
                        warn!("{} Failed to send ping: {}", self.label, e);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<Message> {
        let mut frames = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            frames.push(msg);
        }
        frames
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_immediately_then_every_period() {
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let handle = Heartbeat::new(PING_INTERVAL, tx, cancel.clone(), "[test]").spawn();

        tokio::time::sleep(Duration::from_secs(35)).await;
        cancel.cancel();
        handle.await.unwrap();

        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 4, "expected pings at 0s, 10s, 20s, 30s");
        assert!(frames
            .iter()
            .all(|m| matches!(m, Message::Text(t) if t.as_str() == HEARTBEAT_FRAME)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pings_after_cancel() {
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let handle = Heartbeat::new(PING_INTERVAL, tx, cancel.clone(), "[test]").spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(drain(&mut rx).len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_connection_gone() {
        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let handle = Heartbeat::new(PING_INTERVAL, tx, CancellationToken::new(), "[test]").spawn();

        // No cancellation: the failed send alone ends the task
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("heartbeat should stop once sends fail")
            .unwrap();
    }
}
