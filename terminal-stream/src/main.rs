//! Prediction Market Terminal streaming client
//!
//! Opens one Polymarket WebSocket connection per configured channel, prints
//! every inbound frame to stdout and keeps each connection alive with a
//! heartbeat. The first channel to finish ends the run; the process exits
//! with failure if any channel failed.

mod config;

use std::process::ExitCode;

use terminal_core::ChannelKind;
use terminal_polymarket::{ChannelSubscriber, PolymarketClient};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::StreamConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Logs go to stderr so stdout carries only channel frames
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,terminal_stream=debug")),
        )
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    info!("Starting Prediction Market Terminal stream");

    let config = StreamConfig::from_env()?;

    if let Some(ref creds) = config.credentials {
        info!(
            "Loaded Polymarket credentials from environment (api_key: {}...)",
            creds.key_hint()
        );
    } else if config.channels.contains(&ChannelKind::User) {
        warn!("No Polymarket credentials found - user channel will be rejected");
    }

    let asset_ids = resolve_asset_ids(&config).await;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down");
                shutdown.cancel();
            }
        });
    }

    let mut tasks = JoinSet::new();
    for channel in &config.channels {
        let subscriber = ChannelSubscriber::new(
            channel.clone(),
            &config.endpoint,
            config.subscription_data(channel, &asset_ids),
            config.credentials.clone(),
            None,
            config.verbose,
        )
        .with_ping_interval(config.ping_interval)
        .with_cancellation(shutdown.child_token());

        info!("Starting WebSocket connection for {} channel...", channel);
        let channel = channel.clone();
        tasks.spawn(async move { (channel, subscriber.run().await) });
    }

    let mut failed = false;
    while let Some(joined) = tasks.join_next().await {
        // Any channel ending ends the whole run
        shutdown.cancel();

        match joined {
            Ok((channel, Ok(exit))) => info!("{} channel finished: {}", channel, exit),
            Ok((channel, Err(e))) => {
                error!("{} channel failed: {}", channel, e);
                failed = true;
            }
            Err(e) => {
                error!("Channel task aborted: {}", e);
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Configured asset ids, or the event's token ids when only a slug is given
async fn resolve_asset_ids(config: &StreamConfig) -> Vec<String> {
    let slug = match (&config.event_slug, config.asset_ids.is_empty()) {
        (Some(slug), true) => slug,
        _ => return config.asset_ids.clone(),
    };

    let resolved = match PolymarketClient::new() {
        Ok(client) => client.resolve_asset_ids(slug).await,
        Err(e) => Err(e),
    };

    match resolved {
        Ok(ids) if !ids.is_empty() => {
            info!("Resolved {} asset ids from event {}", ids.len(), slug);
            ids
        }
        Ok(_) => {
            warn!("Event {} has no CLOB token ids, using configured asset ids", slug);
            config.asset_ids.clone()
        }
        Err(e) => {
            warn!("Failed to resolve event {}: {} - using configured asset ids", slug, e);
            config.asset_ids.clone()
        }
    }
}
