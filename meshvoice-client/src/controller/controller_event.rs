use crate::controller::PeerState;
use crate::transport::RemoteTrack;
use meshvoice_core::PeerId;

/// Reports from a controller to its session.
///
/// `generation` tells apart successive controllers for the same remote id.
#[derive(Clone)]
pub enum ControllerEvent {
    StateChanged {
        peer_id: PeerId,
        generation: u64,
        state: PeerState,
    },
    RemoteTrack {
        peer_id: PeerId,
        generation: u64,
        track: RemoteTrack,
    },
}

impl ControllerEvent {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            ControllerEvent::StateChanged { peer_id, .. } => peer_id,
            ControllerEvent::RemoteTrack { peer_id, .. } => peer_id,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            ControllerEvent::StateChanged { generation, .. } => *generation,
            ControllerEvent::RemoteTrack { generation, .. } => *generation,
        }
    }
}

impl std::fmt::Debug for ControllerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerEvent::StateChanged {
                peer_id,
                generation,
                state,
            } => f
                .debug_struct("StateChanged")
                .field("peer_id", peer_id)
                .field("generation", generation)
                .field("state", state)
                .finish(),
            ControllerEvent::RemoteTrack {
                peer_id,
                generation,
                ..
            } => f
                .debug_struct("RemoteTrack")
                .field("peer_id", peer_id)
                .field("generation", generation)
                .finish(),
        }
    }
}
