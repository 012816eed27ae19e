//! WebSocket session handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Registration handshake: the first message must be a valid `register`
//! - Registered loop: forward outbound queue, parse and route inbound frames
//! - Keep-alive ping; no relay-imposed idle timeout
//! - Unregister exactly once on every exit path (RAII guard)
//!
//! Per-connection state machine:
//! `AWAITING_REGISTRATION` (one shot) -> `REGISTERED` (select loop) ->
//! `CLOSED` (guard drop).

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior};

use sigrelay_core::error::{RelayError, Result};
use sigrelay_core::protocol::{control, Envelope};

use crate::app_state::AppState;
use crate::relay::{Connection, RegistrationGuard};

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_session(app, socket))
}

// --------------------
// Registration handshake validation
// --------------------

/// Check a connection's first text frame. Exactly one shape is accepted:
/// `{"type":"register","client_id":"<non-empty string>", ...}`.
pub fn validate_registration(raw: &str) -> Result<String> {
    let env = Envelope::parse(raw)
        .map_err(|_| RelayError::ProtocolViolation("first message must be valid json".into()))?;
    if !env.is_register() {
        return Err(RelayError::ProtocolViolation(
            "first message must be 'register' with client_id".into(),
        ));
    }
    match env.client_id() {
        Some(id) if !id.is_empty() => Ok(id.to_owned()),
        _ => Err(RelayError::ProtocolViolation(
            "register requires a non-empty string client_id".into(),
        )),
    }
}

// --------------------
// Session lifecycle
// --------------------
async fn run_session(app: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // AWAITING_REGISTRATION: one chance, no retry.
    let Some(client_id) = await_registration(&mut ws_tx, &mut ws_rx).await else {
        let _ = ws_tx.close().await;
        return;
    };

    let (out_tx, out_rx) = mpsc::channel::<Message>(app.cfg().relay.outbound_queue);
    let (conn_seq, displaced) = app
        .registry()
        .register(client_id.clone(), Connection { tx: out_tx });

    if let Some(old) = displaced {
        // Close the superseded connection instead of silently abandoning it.
        // Dropping `old` closes its outbound queue, which its session loop
        // observes as an exit condition even if these frames never land.
        tracing::info!(%client_id, "closing superseded connection");
        let _ = old.tx.try_send(Message::Text(control::error_json(
            "registration superseded by a newer connection",
        )));
        let _ = old.tx.try_send(Message::Close(None));
    }

    // From here on the binding is removed exactly once, whichever way the
    // session ends.
    let _guard = RegistrationGuard::new(app.registry_arc(), client_id.clone(), conn_seq);
    tracing::info!(%client_id, "client registered");

    if ws_tx
        .send(Message::Text(control::registered_json(&client_id)))
        .await
        .is_err()
    {
        return;
    }

    registered_loop(&app, &client_id, ws_tx, ws_rx, out_rx).await;
}

/// AWAITING_REGISTRATION: read until the first data frame. Ping/Pong are
/// transport noise and do not count as the first message.
async fn await_registration(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    ws_rx: &mut SplitStream<WebSocket>,
) -> Option<String> {
    while let Some(incoming) = ws_rx.next().await {
        let Ok(msg) = incoming else { return None };
        match msg {
            Message::Text(s) => {
                return match validate_registration(&s) {
                    Ok(client_id) => Some(client_id),
                    Err(e) => {
                        tracing::warn!(error = %e, "rejecting connection: bad registration");
                        let _ = ws_tx
                            .send(Message::Text(control::error_json(&e.to_string())))
                            .await;
                        None
                    }
                };
            }
            Message::Binary(_) => {
                tracing::warn!("rejecting connection: binary frame before registration");
                let _ = ws_tx
                    .send(Message::Text(control::error_json(
                        "first message must be 'register' with client_id",
                    )))
                    .await;
                return None;
            }
            Message::Ping(payload) => {
                if ws_tx.send(Message::Pong(payload)).await.is_err() {
                    return None;
                }
            }
            Message::Pong(_) => {}
            Message::Close(_) => return None,
        }
    }
    None
}

/// REGISTERED: pump the outbound queue and route inbound frames until the
/// transport closes, a write fails, or the binding is superseded.
async fn registered_loop(
    app: &AppState,
    client_id: &str,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut out_rx: mpsc::Receiver<Message>,
) {
    let mut ping_tick =
        tokio::time::interval(Duration::from_millis(app.cfg().relay.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        let closing = matches!(m, Message::Close(_));
                        if ws_tx.send(m).await.is_err() || closing {
                            break;
                        }
                    }
                    // registry binding dropped: this session was superseded
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break };
                let Ok(msg) = incoming else { break };

                match msg {
                    Message::Text(s) => match Envelope::parse(&s) {
                        Ok(env) => app.router().handle_message(client_id, env).await,
                        // one malformed frame does not terminate the connection
                        Err(e) => {
                            tracing::warn!(%client_id, error = %e, "dropping malformed message");
                        }
                    },
                    Message::Binary(_) => {
                        tracing::warn!(%client_id, "dropping binary frame");
                    }
                    Message::Ping(payload) => {
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => break,
                }
            }

            // keep-alive ping
            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = ws_tx.close().await;
}
