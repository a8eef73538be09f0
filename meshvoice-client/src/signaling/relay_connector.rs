use crate::error::SessionError;
use async_trait::async_trait;
use meshvoice_core::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;

/// Both directions of an open relay connection.
///
/// Dropping `outbound` closes the connection; `inbound` ends when the relay
/// goes away.
pub struct SignalingChannel {
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

/// Opens connections to a relay.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self) -> Result<SignalingChannel, SessionError>;
}
