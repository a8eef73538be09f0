use meshvoice_core::{ClientMessage, PeerId, SignalPayload};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Where controllers hand the payloads addressed to their remote peer.
pub trait SignalSink: Send + Sync {
    fn send_signal(&self, to: &PeerId, payload: SignalPayload);
}

/// Wraps payloads in `signal` frames on the relay connection.
#[derive(Clone)]
pub struct RelaySink {
    outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl RelaySink {
    pub fn new(outbound: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self { outbound }
    }
}

impl SignalSink for RelaySink {
    fn send_signal(&self, to: &PeerId, payload: SignalPayload) {
        let signal = match payload.encode() {
            Ok(signal) => signal,
            Err(e) => {
                error!("Failed to encode {} for {}: {}", payload.kind_name(), to, e);
                return;
            }
        };
        debug!("Sending {} to {}", payload.kind_name(), to);
        if self
            .outbound
            .send(ClientMessage::Signal {
                to: to.clone(),
                signal,
            })
            .is_err()
        {
            debug!("Relay connection gone, dropping {} for {}", payload.kind_name(), to);
        }
    }
}
