//! Polymarket WebSocket channel subscriber
//!
//! Connects to `<endpoint>/ws/<channel>`, sends exactly one subscription
//! frame once the connection opens, keeps the connection alive with a
//! `PING` heartbeat and hands every inbound text frame to a message handler.
//!
//! All outbound frames go through a single writer task that owns the sink
//! half of the socket. Reconnection is not attempted: every close or error is
//! terminal and is reported as the result of [`ChannelSubscriber::run`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use terminal_core::{
    ChannelKind, StateCell, SubscriberExit, SubscriberState, TerminalError, TerminalResult,
};

use crate::client::PolymarketCredentials;
use crate::heartbeat::{Heartbeat, PING_INTERVAL};
use crate::types::SubscriptionMessage;

/// Outbound frame queue depth
const OUTBOUND_BUFFER: usize = 64;

/// Upper bound on the close handshake when the writer shuts down
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Message Handlers
// ============================================================================

/// Receives every inbound text frame while the channel is open
pub trait MessageHandler: Send + Sync {
    fn on_message(&self, channel: &ChannelKind, message: &str);
}

impl<F> MessageHandler for F
where
    F: Fn(&ChannelKind, &str) + Send + Sync,
{
    fn on_message(&self, channel: &ChannelKind, message: &str) {
        self(channel, message)
    }
}

/// Default handler: print the raw frame to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintHandler;

impl MessageHandler for PrintHandler {
    fn on_message(&self, _channel: &ChannelKind, message: &str) {
        println!("{}", message);
    }
}

// ============================================================================
// Channel Subscriber
// ============================================================================

/// Subscriber for a single Polymarket WebSocket channel
pub struct ChannelSubscriber {
    channel: ChannelKind,
    url: String,
    data: Vec<String>,
    credentials: Option<PolymarketCredentials>,
    handler: Arc<dyn MessageHandler>,
    verbose: bool,
    ping_interval: Duration,
    cancel: CancellationToken,
    state: StateCell,
    label: String,
}

impl ChannelSubscriber {
    /// Create a subscriber. No connection is made until [`run`](Self::run).
    ///
    /// `data` holds asset ids for the market channel or market ids for the
    /// user channel. Without a handler, inbound frames are printed to stdout.
    pub fn new(
        channel: impl Into<ChannelKind>,
        endpoint: &str,
        data: Vec<String>,
        credentials: Option<PolymarketCredentials>,
        handler: Option<Arc<dyn MessageHandler>>,
        verbose: bool,
    ) -> Self {
        let channel = channel.into();
        let url = format!("{}/ws/{}", endpoint, channel.as_str());
        let label = format!("[Polymarket WS {}]", channel);

        Self {
            channel,
            url,
            data,
            credentials,
            handler: handler.unwrap_or_else(|| Arc::new(PrintHandler) as Arc<dyn MessageHandler>),
            verbose,
            ping_interval: PING_INTERVAL,
            cancel: CancellationToken::new(),
            state: StateCell::new(SubscriberState::Created),
            label,
        }
    }

    /// Override the heartbeat interval
    pub fn with_ping_interval(mut self, ping_interval: Duration) -> Self {
        self.ping_interval = ping_interval;
        self
    }

    /// Tie this subscriber to an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn channel(&self) -> &ChannelKind {
        &self.channel
    }

    /// Target address (`<endpoint>/ws/<channel>`)
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> SubscriberState {
        self.state.get()
    }

    /// Token that ends a running subscriber with [`SubscriberExit::Cancelled`]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Connect, subscribe and stream until the connection terminates
    ///
    /// A remote close or end of stream is returned as `Ok`; configuration and
    /// transport failures are returned as `Err`. A subscriber runs at most once.
    pub async fn run(&self) -> TerminalResult<SubscriberExit> {
        if !self
            .state
            .transition(SubscriberState::Created, SubscriberState::Connecting)
        {
            return Err(TerminalError::internal(format!(
                "{} Subscriber already started (state: {:?})",
                self.label,
                self.state()
            )));
        }

        let outcome = self.drive().await;
        match &outcome {
            Ok(exit) => {
                self.state.set(SubscriberState::Closed);
                info!("{} Closing: {}", self.label, exit);
            }
            Err(e) => {
                self.state.set(SubscriberState::Failed);
                error!("{} Error: {}", self.label, e);
            }
        }
        outcome
    }

    async fn drive(&self) -> TerminalResult<SubscriberExit> {
        self.lifecycle(format_args!("Connecting to {}", self.url));

        let connected = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(SubscriberExit::Cancelled),
            result = connect_async(self.url.as_str()) => result,
        };
        let (ws_stream, _) = connected
            .map_err(|e| TerminalError::network(format!("Connection failed: {}", e)))?;

        self.lifecycle(format_args!("Connection opened for {} channel", self.channel));

        // Dropping the stream here closes the socket without sending a frame
        let subscription =
            SubscriptionMessage::build(&self.channel, &self.data, self.credentials.as_ref())?;
        let payload = subscription.to_json()?;

        let (write, mut read) = ws_stream.split();
        let (outbound_tx, outbound_rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);
        let session = self.cancel.child_token();
        let writer = tokio::spawn(write_loop(
            write,
            outbound_rx,
            session.clone(),
            self.label.clone(),
        ));

        let logged = subscription.masked().to_json()?;
        self.lifecycle(format_args!("Sending subscription message: {}", logged));
        if outbound_tx.send(Message::Text(payload.into())).await.is_err() {
            session.cancel();
            if let Err(e) = writer.await {
                warn!("{} Writer task failed: {}", self.label, e);
            }
            return Err(TerminalError::network("Connection closed before subscribing"));
        }
        self.state.set(SubscriberState::Open);

        let heartbeat = Heartbeat::new(
            self.ping_interval,
            outbound_tx.clone(),
            session.child_token(),
            self.label.clone(),
        )
        .spawn();
        self.lifecycle(format_args!("Ping task started"));

        let outcome = self.read_loop(&mut read, &outbound_tx).await;

        // Terminal transition: stop the heartbeat and writer before returning
        session.cancel();
        drop(outbound_tx);
        if let Err(e) = heartbeat.await {
            warn!("{} Heartbeat task failed: {}", self.label, e);
        }
        if let Err(e) = writer.await {
            warn!("{} Writer task failed: {}", self.label, e);
        }

        outcome
    }

    async fn read_loop<S>(
        &self,
        read: &mut S,
        outbound: &mpsc::Sender<Message>,
    ) -> TerminalResult<SubscriberExit>
    where
        S: futures_util::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("{} Cancelled", self.label);
                    return Ok(SubscriberExit::Cancelled);
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handler.on_message(&self.channel, text.as_str());
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if outbound.send(Message::Pong(data)).await.is_err() {
                                warn!("{} Failed to queue pong", self.label);
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (Some(u16::from(f.code)), f.reason.as_str().to_string()))
                                .unwrap_or((None, String::new()));
                            return Ok(SubscriberExit::ClosedByRemote { code, reason });
                        }
                        Some(Ok(Message::Binary(data))) => {
                            debug!("{} Ignoring binary frame ({} bytes)", self.label, data.len());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(TerminalError::network(e.to_string()));
                        }
                        None => {
                            return Ok(SubscriberExit::StreamEnded);
                        }
                    }
                }
            }
        }
    }

    fn lifecycle(&self, message: std::fmt::Arguments<'_>) {
        if self.verbose {
            info!("{} {}", self.label, message);
        } else {
            debug!("{} {}", self.label, message);
        }
    }
}

impl std::fmt::Debug for ChannelSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSubscriber")
            .field("channel", &self.channel)
            .field("url", &self.url)
            .field("data", &self.data)
            .field("credentials", &self.credentials)
            .field("verbose", &self.verbose)
            .field("ping_interval", &self.ping_interval)
            .field("state", &self.state())
            .finish()
    }
}

/// Single writer for one connection
///
/// Frames are written in queue order. Once the session is cancelled, queued
/// frames are discarded and a close handshake is attempted.
async fn write_loop<W>(
    mut write: W,
    mut outbound: mpsc::Receiver<Message>,
    session: CancellationToken,
    label: String,
) where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = session.cancelled() => break,
            msg = outbound.recv() => {
                match msg {
                    Some(msg) => {
                        if let Err(e) = write.send(msg).await {
                            warn!("{} Failed to send frame: {}", label, e);
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    outbound.close();
    match tokio::time::timeout(CLOSE_TIMEOUT, write.close()).await {
        Ok(Ok(())) => debug!("{} Writer closed", label),
        Ok(Err(e)) => debug!("{} Close handshake skipped: {}", label, e),
        Err(_) => debug!("{} Close handshake timed out", label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_url_construction() {
        let sub = ChannelSubscriber::new(
            ChannelKind::Market,
            "wss://ws-subscriptions-clob.polymarket.com",
            vec![],
            None,
            None,
            false,
        );
        assert_eq!(sub.url(), "wss://ws-subscriptions-clob.polymarket.com/ws/market");
        assert_eq!(sub.state(), SubscriberState::Created);
    }

    #[test]
    fn test_unknown_channel_url() {
        let sub = ChannelSubscriber::new("orders", "ws://localhost:1", vec![], None, None, true);
        assert_eq!(sub.url(), "ws://localhost:1/ws/orders");
        assert_eq!(sub.channel(), &ChannelKind::Other("orders".to_string()));
    }

    #[test]
    fn test_closure_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Arc<dyn MessageHandler> = Arc::new(move |channel: &ChannelKind, msg: &str| {
            sink.lock().push(format!("{}:{}", channel, msg));
        });
        handler.on_message(&ChannelKind::User, "hello");
        assert_eq!(seen.lock().as_slice(), ["user:hello"]);
    }

    #[test]
    fn test_debug_hides_credentials() {
        let creds = PolymarketCredentials::new(
            "key-0123456789".to_string(),
            "topsecret".to_string(),
            "phrase".to_string(),
        );
        let sub = ChannelSubscriber::new(
            ChannelKind::User,
            "ws://localhost:1",
            vec!["M1".to_string()],
            Some(creds),
            None,
            false,
        );
        let debug = format!("{:?}", sub);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("M1"));
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let sub = ChannelSubscriber::new(
            ChannelKind::Market,
            "ws://127.0.0.1:9",
            vec![],
            None,
            None,
            false,
        );
        sub.cancellation_token().cancel();
        let exit = sub.run().await.unwrap();
        assert_eq!(exit, SubscriberExit::Cancelled);
        assert_eq!(sub.state(), SubscriberState::Closed);
    }

    #[tokio::test]
    async fn test_runs_at_most_once() {
        let sub = ChannelSubscriber::new(
            ChannelKind::Market,
            "ws://127.0.0.1:9",
            vec![],
            None,
            None,
            false,
        );
        sub.cancellation_token().cancel();
        let _ = sub.run().await;
        let err = sub.run().await.unwrap_err();
        assert!(matches!(err, TerminalError::Internal(_)));
    }
}
