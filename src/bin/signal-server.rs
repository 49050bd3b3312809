//! Standalone signaling server
//!
//! Run with: cargo run --bin signal-server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --bin signal-server                  # binds to 0.0.0.0:8080
//!   cargo run --bin signal-server 127.0.0.1:9000
//!
//! ## Endpoints
//!
//!   POST /signaling/push        uid, streamName, audio, video, [sdp]
//!   POST /signaling/pull        uid, streamName, audio, video, [sdp]
//!   POST /signaling/sendanswer  uid, streamName, answer, type
//!   POST /signaling/stoppush    uid, streamName
//!   POST /signaling/stoppull    uid, streamName
//!   GET  /health
//!
//! Sessions are attached to a no-op media bridge; wire a real backend by
//! embedding `SignalingServer` with your own `MediaBridge` implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use signal_rs::bridge::NullBridge;
use signal_rs::{ServerConfig, SignalingServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let bind_addr: SocketAddr = match args.get(1) {
        Some(addr) => addr.parse()?,
        None => "0.0.0.0:8080".parse().unwrap(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("signal_rs=debug".parse()?)
                .add_directive("signal_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig::default().bind(bind_addr);
    println!("Starting signaling server on {}", config.bind_addr);

    let server = SignalingServer::new(config, Arc::new(NullBridge::new()));
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
