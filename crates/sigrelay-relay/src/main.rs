//! sigrelay relay binary.
//!
//! WebSocket signaling relay for WebRTC bootstrap:
//! - WebSocket endpoint: /v1/ws
//! - First message per connection must be `register`
//! - Subsequent messages are routed by `target_id` (unicast) or fanned out
//!   to all other registered clients (broadcast)

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use sigrelay_relay::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sigrelay.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .relay
        .listen
        .parse()
        .expect("relay.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg);
    let app = router::build_router(state);

    tracing::info!(%listen, "sigrelay starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
