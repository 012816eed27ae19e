//! Shared application state for the sigrelay relay.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::relay::{ClientRegistry, SignalRouter};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: RelayConfig,
    registry: Arc<ClientRegistry>,
    router: SignalRouter,
}

impl AppState {
    pub fn new(cfg: RelayConfig) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let router = SignalRouter::new(Arc::clone(&registry), cfg.relay.send_timeout_ms);
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                router,
            }),
        }
    }

    pub fn cfg(&self) -> &RelayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.inner.registry
    }

    pub fn registry_arc(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn router(&self) -> &SignalRouter {
        &self.inner.router
    }
}
