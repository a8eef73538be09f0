use crate::session::PeerSummary;
use crate::transport::LocalTrack;
use tokio::sync::oneshot;

/// Requests from [`RoomSession`](crate::RoomSession) to its event loop.
pub enum SessionCommand {
    SetLocalTrack {
        track: LocalTrack,
        done: oneshot::Sender<()>,
    },
    Peers(oneshot::Sender<Vec<PeerSummary>>),
    Leave(oneshot::Sender<()>),
}
