//! In-process WebSocket server that records what a subscriber sends

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// Longest the server waits on a silent client before giving up
const IDLE_LIMIT: Duration = Duration::from_secs(5);

/// How long to keep reading after sending a close frame
const DRAIN: Duration = Duration::from_millis(500);

pub const CLOSE_REASON: &str = "bye";

/// When the server initiates the close handshake
#[derive(Debug, Clone, Copy)]
pub enum CloseWhen {
    /// After this many text frames have been received
    Frames(usize),
    /// After this long since the handshake
    After(Duration),
    /// Never; wait for the client to go away
    Never,
}

#[derive(Debug, Clone)]
pub struct Script {
    pub close: CloseWhen,
    /// Text frames pushed to the client right after its first frame
    pub replies: Vec<String>,
}

impl Script {
    pub fn close(close: CloseWhen) -> Self {
        Self {
            close,
            replies: Vec::new(),
        }
    }
}

/// Everything the server observed on one connection
#[derive(Debug, Default)]
pub struct Captured {
    pub path: String,
    /// Text frames received before the server sent its close frame
    pub frames: Vec<String>,
    /// Text frames received after the server sent its close frame
    pub after_close: Vec<String>,
    pub server_closed: bool,
}

pub struct MockChannelServer {
    pub addr: SocketAddr,
    handle: JoinHandle<Captured>,
}

impl MockChannelServer {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(serve(listener, script));
        Self { addr, handle }
    }

    pub fn endpoint(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub async fn captured(self) -> Captured {
        timeout(Duration::from_secs(15), self.handle)
            .await
            .expect("mock server did not finish")
            .unwrap()
    }
}

async fn serve(listener: TcpListener, script: Script) -> Captured {
    let (stream, _) = listener.accept().await.unwrap();

    let mut path = String::new();
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        path = req.uri().path().to_string();
        Ok(resp)
    };
    let mut ws = accept_hdr_async(stream, callback).await.unwrap();

    let mut captured = Captured {
        path,
        ..Default::default()
    };
    let start = Instant::now();
    let mut replied = false;

    loop {
        if let CloseWhen::Frames(n) = script.close {
            if captured.frames.len() >= n {
                break;
            }
        }

        let wait = match script.close {
            CloseWhen::After(d) => d.saturating_sub(start.elapsed()),
            _ => IDLE_LIMIT,
        };

        match timeout(wait, ws.next()).await {
            Err(_) if matches!(script.close, CloseWhen::After(_)) => break,
            Err(_) => return captured,
            Ok(Some(Ok(Message::Text(text)))) => {
                captured.frames.push(text.as_str().to_string());
                if !replied {
                    replied = true;
                    for reply in &script.replies {
                        ws.send(Message::Text(reply.clone().into())).await.unwrap();
                    }
                }
            }
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(_))) | Ok(None) => return captured,
        }
    }

    let close = CloseFrame {
        code: CloseCode::Normal,
        reason: CLOSE_REASON.into(),
    };
    if ws.send(Message::Close(Some(close))).await.is_err() {
        return captured;
    }
    captured.server_closed = true;

    while let Ok(Some(Ok(msg))) = timeout(DRAIN, ws.next()).await {
        if let Message::Text(text) = msg {
            captured.after_close.push(text.as_str().to_string());
        }
    }

    captured
}

/// An address nothing is listening on
pub async fn unused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}
