use std::collections::BTreeSet;

use meshvoice_core::{PeerId, PeerInfo, ServerMessage};

/// Timeout for a single expected frame (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

pub fn ids(peers: &[PeerInfo]) -> BTreeSet<PeerId> {
    peers.iter().map(|p| p.id.clone()).collect()
}

/// Ids announced through `new-peer` frames.
pub fn new_peer_ids(messages: &[ServerMessage]) -> Vec<PeerId> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::NewPeer(info) => Some(info.id.clone()),
            _ => None,
        })
        .collect()
}

/// Ids announced through `peer-disconnect` frames.
pub fn departed_ids(messages: &[ServerMessage]) -> Vec<PeerId> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::PeerDisconnect { id } => Some(id.clone()),
            _ => None,
        })
        .collect()
}
