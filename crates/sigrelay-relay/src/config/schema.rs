use serde::Deserialize;
use sigrelay_core::error::{RelayError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub relay: RelaySection,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::UnsupportedVersion);
        }
        self.relay.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Per-connection outbound queue depth.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    /// Per-recipient send timeout. 0 disables the timeout.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            outbound_queue: default_outbound_queue(),
            ping_interval_ms: default_ping_interval_ms(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl RelaySection {
    pub fn validate(&self) -> Result<()> {
        if !(16..=65536).contains(&self.outbound_queue) {
            return Err(RelayError::InvalidConfig(
                "relay.outbound_queue must be between 16 and 65536".into(),
            ));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(RelayError::InvalidConfig(
                "relay.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if self.send_timeout_ms > 60000 {
            return Err(RelayError::InvalidConfig(
                "relay.send_timeout_ms must not exceed 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:50061".into()
}
fn default_outbound_queue() -> usize {
    1024
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_send_timeout_ms() -> u64 {
    1500
}
