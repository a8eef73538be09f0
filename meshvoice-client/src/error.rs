use meshvoice_core::SdpKind;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by the local network layer of a single peer connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport setup failed: {0}")]
    Setup(String),

    #[error("failed to create local {kind}: {reason}")]
    CreateDescription { kind: SdpKind, reason: String },

    #[error("failed to apply remote {kind}: {reason}")]
    ApplyDescription { kind: SdpKind, reason: String },

    #[error("failed to roll back local offer: {0}")]
    Rollback(String),

    #[error("failed to add remote candidate: {0}")]
    Candidate(String),

    #[error("failed to attach local track: {0}")]
    Track(String),

    #[error("failed to close transport: {0}")]
    Close(String),
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("audio source unavailable: {0}")]
    Unavailable(String),
}

/// Why a controller gave up on its peer.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("negotiation did not finish within {0:?}")]
    NegotiationTimeout(Duration),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session already joined a room")]
    AlreadyJoined,

    #[error("session has not joined a room")]
    NotJoined,

    #[error("local media: {0}")]
    Media(#[from] MediaError),

    #[error("relay connection: {0}")]
    Relay(String),

    #[error("relay handshake: {0}")]
    Handshake(String),

    #[error("relay did not greet us within {0:?}")]
    HandshakeTimeout(Duration),
}
