//! Mesh voice rooms: a signaling relay plus participants that connect to
//! each other directly.
//!
//! Enable `server` for the relay and `client` for the participant side.

pub use meshvoice_core::model::PeerId;

pub mod model {
    pub use meshvoice_core::model::*;
}

pub mod utils {
    pub use meshvoice_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meshvoice_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshvoice_client::*;
}
