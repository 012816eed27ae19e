use std::sync::Arc;

use axum::extract::ws::Message;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::time::{timeout, Duration};

use sigrelay_core::protocol::Envelope;

use crate::relay::registry::{ClientRegistry, Connection};

/// SignalRouter: the relay's single routing decision point.
///
/// Every post-registration message is stamped with the sender's registered id
/// and then either forwarded to one named peer or fanned out to all others.
pub struct SignalRouter {
    registry: Arc<ClientRegistry>,
    send_timeout: Option<Duration>,
}

impl SignalRouter {
    /// `send_timeout_ms == 0` disables the per-recipient send timeout.
    pub fn new(registry: Arc<ClientRegistry>, send_timeout_ms: u64) -> Self {
        Self {
            registry,
            send_timeout: (send_timeout_ms > 0).then(|| Duration::from_millis(send_timeout_ms)),
        }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Stamp `from` (overwriting any client-supplied value) and route:
    /// non-empty `target_id` is unicast, anything else is broadcast to every
    /// peer except the sender. There is no third branch.
    pub async fn handle_message(&self, from_id: &str, mut env: Envelope) {
        env.from = Some(from_id.to_owned());
        match env.unicast_target().map(str::to_owned) {
            Some(target) => {
                let _ = self.send_to(&target, &env).await;
            }
            None => self.broadcast(&env, from_id).await,
        }
    }

    /// Forward one message to one registered peer. A miss or a failed write is
    /// logged and reported as `false`; the stale binding is left in place for
    /// the owning session's own cleanup.
    pub async fn send_to(&self, target_id: &str, env: &Envelope) -> bool {
        let Some(conn) = self.registry.get(target_id) else {
            tracing::warn!(%target_id, msg_type = %env.msg_type, "routing miss: target not registered");
            return false;
        };

        let text = match env.to_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(%target_id, error = %e, "message encode failed");
                return false;
            }
        };

        if self.deliver(&conn, Message::Text(text)).await {
            tracing::debug!(%target_id, msg_type = %env.msg_type, "message forwarded");
            true
        } else {
            tracing::warn!(%target_id, msg_type = %env.msg_type, "delivery failed: peer queue closed or stalled");
            false
        }
    }

    /// Fan one message out to every registered peer except `exclude_id`,
    /// serialize once, send N times. Sends run concurrently and each outcome
    /// is collected independently, so one dead or slow recipient never blocks
    /// delivery to the rest.
    pub async fn broadcast(&self, env: &Envelope, exclude_id: &str) {
        let text = match env.to_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "broadcast encode failed");
                return;
            }
        };

        let mut sends = FuturesUnordered::new();
        for (client_id, conn) in self.registry.peers_of(exclude_id) {
            let msg = Message::Text(text.clone());
            sends.push(async move { (client_id, self.deliver(&conn, msg).await) });
        }

        let (mut delivered, mut failed) = (0usize, 0usize);
        while let Some((client_id, ok)) = sends.next().await {
            if ok {
                delivered += 1;
            } else {
                failed += 1;
                tracing::warn!(%client_id, msg_type = %env.msg_type, "broadcast delivery failed");
            }
        }
        tracing::debug!(delivered, failed, exclude = %exclude_id, "broadcast complete");
    }

    async fn deliver(&self, conn: &Connection, msg: Message) -> bool {
        match self.send_timeout {
            Some(t) => matches!(timeout(t, conn.tx.send(msg)).await, Ok(Ok(()))),
            None => conn.tx.send(msg).await.is_ok(),
        }
    }
}
