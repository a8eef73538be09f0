use crate::transport::LocalTrack;
use meshvoice_core::SignalPayload;
use tokio::sync::oneshot;

/// Work queued for a controller task, processed strictly in order.
pub enum PeerCommand {
    /// A decoded `signal` frame from the remote peer. `None` is the flush marker.
    Signal(Option<SignalPayload>),

    /// Swap or attach the outbound track. `done` fires once the transport
    /// references the new track.
    SetTrack {
        track: LocalTrack,
        done: oneshot::Sender<()>,
    },
}
