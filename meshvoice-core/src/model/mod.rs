mod peer;
mod room;
mod signaling;

pub use peer::{PeerId, PeerInfo};
pub use room::{DEFAULT_ROOMS, guest_name, resolve_display_name};
pub use signaling::{
    ClientMessage, IceCandidate, IceServerConfig, SdpKind, ServerMessage, SignalPayload,
};
