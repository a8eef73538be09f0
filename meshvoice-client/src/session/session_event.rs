use crate::controller::{PeerState, Role};
use crate::transport::RemoteTrack;
use meshvoice_core::PeerId;
use std::fmt;

/// What the UI layer hears about a room.
#[derive(Clone)]
pub enum SessionEvent {
    /// Another participant is in the room, either already there or just arrived.
    PeerJoined { id: PeerId, display_name: String },
    PeerStateChanged { id: PeerId, state: PeerState },
    /// The relay announced a departure.
    PeerLeft { id: PeerId },
    RemoteTrack { id: PeerId, track: RemoteTrack },
    /// The relay connection ended without `leave`. All peers are gone.
    RelayDisconnected,
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::PeerJoined { id, display_name } => f
                .debug_struct("PeerJoined")
                .field("id", id)
                .field("display_name", display_name)
                .finish(),
            SessionEvent::PeerStateChanged { id, state } => f
                .debug_struct("PeerStateChanged")
                .field("id", id)
                .field("state", state)
                .finish(),
            SessionEvent::PeerLeft { id } => f.debug_struct("PeerLeft").field("id", id).finish(),
            SessionEvent::RemoteTrack { id, .. } => {
                f.debug_struct("RemoteTrack").field("id", id).finish()
            }
            SessionEvent::RelayDisconnected => f.write_str("RelayDisconnected"),
        }
    }
}

/// Point-in-time view of one live peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSummary {
    pub id: PeerId,
    pub display_name: Option<String>,
    pub role: Role,
    pub state: PeerState,
}
