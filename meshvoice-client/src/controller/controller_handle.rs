use crate::controller::{PeerCommand, PeerController, PeerState, Role};
use crate::transport::{LocalTrack, PeerTransport, TransportEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Session-side handle of a running controller task.
pub struct ControllerHandle {
    pub role: Role,
    pub generation: u64,
    /// Last state reported by the task.
    pub state: PeerState,
    inbox: mpsc::UnboundedSender<PeerCommand>,
    transport: Arc<dyn PeerTransport>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Moves `controller` onto its own task. `initial_track` is attached
    /// before an initiator makes its first offer.
    pub fn spawn(
        controller: PeerController,
        transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
        initial_track: Option<LocalTrack>,
    ) -> Self {
        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let role = controller.role();
        let generation = controller.generation();
        let transport = controller.transport();

        let task = tokio::spawn(run(controller, inbox_rx, transport_rx, initial_track));

        Self {
            role,
            generation,
            state: PeerState::Idle,
            inbox,
            transport,
            task,
        }
    }

    /// Queues `command`; false if the task already ended.
    pub fn send(&self, command: PeerCommand) -> bool {
        self.inbox.send(command).is_ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task, then closes the transport. Anything the task was
    /// awaiting is dropped unapplied.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
        if let Err(e) = self.transport.close().await {
            warn!("Closing transport: {}", e);
        }
    }
}

async fn run(
    mut controller: PeerController,
    mut inbox: mpsc::UnboundedReceiver<PeerCommand>,
    mut transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    initial_track: Option<LocalTrack>,
) {
    if let Some(track) = initial_track {
        controller.set_track(track).await;
    }
    controller.start().await;

    while !controller.state().is_terminal() {
        tokio::select! {
            cmd = inbox.recv() => {
                match cmd {
                    Some(c) => controller.handle_command(c).await,
                    None => break,
                }
            }

            evt = transport_rx.recv() => {
                match evt {
                    Some(e) => controller.handle_transport_event(e).await,
                    None => break,
                }
            }

            _ = negotiation_expiry(controller.negotiation_deadline()) => {
                controller.expire_negotiation();
            }
        }
    }

    debug!(
        "Controller for {} stopped in state {}",
        controller.remote_id(),
        controller.state()
    );
}

async fn negotiation_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
