use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One client's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

#[derive(Clone)]
struct ClientEntry {
    conn: Connection,
    conn_seq: u64,
}

/// Client registry: `client_id -> Connection`, last write wins.
///
/// Each binding carries a process-unique sequence number so that a superseded
/// session's cleanup cannot evict the binding that replaced it.
#[derive(Default)]
pub struct ClientRegistry {
    clients: DashMap<String, ClientEntry>,
    seq: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Bind `client_id`, replacing any prior binding for the same id.
    /// Returns this binding's sequence number and the displaced connection,
    /// if any, so the caller can close it.
    pub fn register(&self, client_id: String, conn: Connection) -> (u64, Option<Connection>) {
        let conn_seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let displaced = self
            .clients
            .insert(client_id, ClientEntry { conn, conn_seq })
            .map(|prior| prior.conn);
        (conn_seq, displaced)
    }

    /// Remove the binding for `client_id` if it still carries `conn_seq`.
    /// No-op (returns false) when the id is absent or already rebound.
    pub fn unregister(&self, client_id: &str, conn_seq: u64) -> bool {
        self.clients
            .remove_if(client_id, |_, entry| entry.conn_seq == conn_seq)
            .is_some()
    }

    pub fn get(&self, client_id: &str) -> Option<Connection> {
        self.clients.get(client_id).map(|r| r.value().conn.clone())
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }

    /// Snapshot of every registered connection except `exclude_id`.
    pub fn peers_of(&self, exclude_id: &str) -> Vec<(String, Connection)> {
        self.clients
            .iter()
            .filter(|e| e.key() != exclude_id)
            .map(|e| (e.key().clone(), e.value().conn.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Unregisters its binding on drop, so cleanup runs on every session exit
/// path: clean close, read error, cancellation, panic unwinding.
pub struct RegistrationGuard {
    registry: Arc<ClientRegistry>,
    client_id: String,
    conn_seq: u64,
}

impl RegistrationGuard {
    pub fn new(registry: Arc<ClientRegistry>, client_id: String, conn_seq: u64) -> Self {
        Self {
            registry,
            client_id,
            conn_seq,
        }
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if self.registry.unregister(&self.client_id, self.conn_seq) {
            tracing::info!(client_id = %self.client_id, "client unregistered");
        }
    }
}
