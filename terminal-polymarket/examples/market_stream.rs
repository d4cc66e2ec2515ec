//! Stream the Polymarket market channel for one asset and print every frame
//!
//! Run with: cargo run -p terminal-polymarket --example market_stream [asset_id]
//! Stops after 60 seconds or on the first close/error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use terminal_core::ChannelKind;
use terminal_polymarket::{ChannelSubscriber, MessageHandler, POLYMARKET_WS_BASE};

// Super Bowl 2026 - Buffalo Bills YES (more likely to have activity)
const DEFAULT_TOKEN: &str =
    "19740329944962592380580142050369523795065853055987745520766432334608119837023";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let token = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_TOKEN.to_string());
    let start = Instant::now();

    let handler: Arc<dyn MessageHandler> = Arc::new(move |_: &ChannelKind, text: &str| {
        let preview = if text.chars().count() > 300 {
            format!("{}...", text.chars().take(300).collect::<String>())
        } else {
            text.to_string()
        };
        println!("{:>5.1}s {}", start.elapsed().as_secs_f64(), preview);
    });

    let subscriber = ChannelSubscriber::new(
        ChannelKind::Market,
        POLYMARKET_WS_BASE,
        vec![token],
        None,
        Some(handler),
        true,
    );

    let cancel = subscriber.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.cancel();
    });

    match subscriber.run().await {
        Ok(exit) => println!("\nStream finished after {:.1}s: {}", start.elapsed().as_secs_f64(), exit),
        Err(e) => println!("\nStream failed after {:.1}s: {}", start.elapsed().as_secs_f64(), e),
    }
}
