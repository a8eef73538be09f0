use meshvoice_core::IceServerConfig;

/// Runtime settings of a relay instance.
#[derive(Clone, Debug, Default)]
pub struct RelayConfig {
    /// Advertised to every participant right after `welcome`. Empty means
    /// clients fall back to their own defaults.
    pub ice_servers: Vec<IceServerConfig>,
}

impl RelayConfig {
    pub fn with_ice_servers(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}
