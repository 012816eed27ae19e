//! Relay runtime: the client registry and the routing policy built on it.

mod registry;
mod routing;

pub use registry::{ClientRegistry, Connection, RegistrationGuard};
pub use routing::SignalRouter;
