use meshvoice_core::IceCandidate;
use std::sync::Arc;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Outbound audio shared by every peer connection of a session.
pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// Inbound audio from one remote participant.
pub type RemoteTrack = Arc<TrackRemote>;

/// Connectivity as last reported by the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl From<RTCPeerConnectionState> for LinkState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::Connecting => LinkState::Connecting,
            RTCPeerConnectionState::Connected => LinkState::Connected,
            RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
            RTCPeerConnectionState::Failed => LinkState::Failed,
            RTCPeerConnectionState::Closed => LinkState::Closed,
            _ => LinkState::New,
        }
    }
}

/// Events a transport raises on its own, outside of any call.
#[derive(Clone)]
pub enum TransportEvent {
    /// A local candidate was gathered and should reach the remote side.
    LocalCandidate(IceCandidate),

    ConnectionState(LinkState),

    /// The remote side started sending audio.
    RemoteTrack(RemoteTrack),
}

impl std::fmt::Debug for TransportEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportEvent::LocalCandidate(c) => f.debug_tuple("LocalCandidate").field(c).finish(),
            TransportEvent::ConnectionState(s) => f.debug_tuple("ConnectionState").field(s).finish(),
            TransportEvent::RemoteTrack(_) => f.write_str("RemoteTrack"),
        }
    }
}
