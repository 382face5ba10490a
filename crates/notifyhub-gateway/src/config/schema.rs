use std::net::SocketAddr;

use serde::Deserialize;
use notifyhub_core::error::{NotifyError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub hub: HubSection,

    #[serde(default)]
    pub service: ServiceSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            hub: HubSection::default(),
            service: ServiceSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(NotifyError::UnsupportedVersion);
        }
        self.server.validate()?;
        self.hub.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen
            .parse::<SocketAddr>()
            .map(|_| ())
            .map_err(|_| NotifyError::BadRequest("server.listen must be a valid SocketAddr".into()))
    }

    /// Resolve the bind address, letting a `PORT`-style override replace the
    /// configured port.
    pub fn listen_addr(&self, port_override: Option<&str>) -> Result<SocketAddr> {
        let mut addr: SocketAddr = self
            .listen
            .parse()
            .map_err(|_| NotifyError::BadRequest("server.listen must be a valid SocketAddr".into()))?;
        if let Some(p) = port_override.filter(|p| !p.is_empty()) {
            let port = p
                .parse::<u16>()
                .map_err(|_| NotifyError::BadRequest(format!("invalid port number: {p}")))?;
            addr.set_port(port);
        }
        Ok(addr)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubSection {
    /// Per-connection outbound queue size; a full queue evicts the client.
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    /// Largest inbound frame accepted before the session is dropped.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            outbound_capacity: default_outbound_capacity(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl HubSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=65536).contains(&self.outbound_capacity) {
            return Err(NotifyError::BadRequest(
                "hub.outbound_capacity must be between 1 and 65536".into(),
            ));
        }
        if !(128..=1 << 20).contains(&self.max_message_bytes) {
            return Err(NotifyError::BadRequest(
                "hub.max_message_bytes must be between 128 and 1048576".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8081".into()
}
fn default_outbound_capacity() -> usize {
    256
}
fn default_max_message_bytes() -> usize {
    4096
}
fn default_service_name() -> String {
    "notification-service".into()
}
fn default_service_version() -> String {
    "1.0.0".into()
}
