use meshvoice_core::{PeerId, ServerMessage};

/// Delivery side of the relay: hands a frame to the connection owning `peer_id`.
///
/// Called while a room entry is locked, so implementations must not block.
pub trait SignalingOutput: Send + Sync {
    /// Returns `false` when the peer is no longer connected.
    fn send(&self, peer_id: &PeerId, msg: ServerMessage) -> bool;
}
