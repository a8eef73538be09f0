use crate::error::TransportError;
use crate::transport::{LocalTrack, TransportEvent};
use async_trait::async_trait;
use meshvoice_core::{IceCandidate, IceServerConfig, PeerId, SdpKind};
use tokio::sync::mpsc;

/// What happened to the outbound audio when a track was attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackAttachment {
    /// Swapped in place on an existing sender; no negotiation needed.
    Replaced,
    /// Added where no track existed; the remote side must be told via a new offer.
    Added,
}

/// Negotiation capability of one peer connection.
///
/// `create_offer` and `create_answer` also install the result as the local
/// description.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<String, TransportError>;

    async fn create_answer(&self) -> Result<String, TransportError>;

    async fn apply_remote_description(&self, kind: SdpKind, sdp: String)
    -> Result<(), TransportError>;

    /// Discards the outstanding local offer.
    async fn rollback_local_offer(&self) -> Result<(), TransportError>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    async fn attach_track(&self, track: LocalTrack) -> Result<TrackAttachment, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// Builds one transport per remote participant.
///
/// Asynchronous notifications of the new transport go to `events`.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: &PeerId,
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError>;
}
