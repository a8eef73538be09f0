use meshvoice_core::IceServerConfig;
use meshvoice_core::utils::default_ice_servers;
use std::time::Duration;

/// Participant-side settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Used until the relay advertises its own list.
    pub ice_servers: Vec<IceServerConfig>,

    /// Also open a connection towards peers announced by `new-peer`.
    /// Off by default: the joiner makes the offer and we answer it.
    pub initiate_on_peer_joined: bool,

    /// How long `join` waits for the relay's `welcome` frame.
    pub handshake_timeout: Duration,

    /// A peer whose offer/answer round takes longer than this is failed.
    pub negotiation_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
            initiate_on_peer_joined: false,
            handshake_timeout: Duration::from_secs(10),
            negotiation_timeout: Duration::from_secs(30),
        }
    }
}
