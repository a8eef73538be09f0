use crate::candidate_queue::CandidateQueue;
use crate::controller::{ControllerEvent, PeerCommand, PeerState, Role};
use crate::error::ControllerError;
use crate::signaling::SignalSink;
use crate::transport::{
    LinkState, LocalTrack, PeerTransport, TrackAttachment, TransportEvent,
};
use meshvoice_core::{IceCandidate, PeerId, SdpKind, SignalPayload};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Negotiation state machine for the connection to one remote participant.
///
/// Every input (signals, transport events, track changes) goes through
/// `&mut self`, so inputs for one peer are applied strictly one at a time.
/// Offer collisions are settled by id: the greater [`PeerId`] keeps its offer.
pub struct PeerController {
    local_id: PeerId,
    remote_id: PeerId,
    role: Role,
    generation: u64,
    state: PeerState,
    transport: Arc<dyn PeerTransport>,
    signals: Arc<dyn SignalSink>,
    events: mpsc::UnboundedSender<ControllerEvent>,

    /// Remote candidates received before any remote description.
    remote_candidates: CandidateQueue,
    /// Local candidates gathered before any remote description.
    local_candidates: CandidateQueue,

    has_remote_description: bool,
    offer_outstanding: bool,
    renegotiation_pending: bool,
    /// Last connectivity report from the transport was "connected".
    transport_connected: bool,

    negotiation_timeout: Option<Duration>,
    negotiating_since: Option<Instant>,
}

impl PeerController {
    pub fn new(
        local_id: PeerId,
        remote_id: PeerId,
        role: Role,
        transport: Arc<dyn PeerTransport>,
        signals: Arc<dyn SignalSink>,
        events: mpsc::UnboundedSender<ControllerEvent>,
    ) -> Self {
        Self {
            local_id,
            remote_id,
            role,
            generation: 0,
            state: PeerState::Idle,
            transport,
            signals,
            events,
            remote_candidates: CandidateQueue::new(),
            local_candidates: CandidateQueue::new(),
            has_remote_description: false,
            offer_outstanding: false,
            renegotiation_pending: false,
            transport_connected: false,
            negotiation_timeout: None,
            negotiating_since: None,
        }
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Fails the connection if one negotiation round is not done within `timeout`.
    pub fn with_negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout = Some(timeout);
        self
    }

    pub fn remote_id(&self) -> &PeerId {
        &self.remote_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_remote_description(&self) -> bool {
        self.has_remote_description
    }

    pub fn offer_outstanding(&self) -> bool {
        self.offer_outstanding
    }

    /// Remote candidates still waiting for a remote description.
    pub fn queued_candidates(&self) -> usize {
        self.remote_candidates.len()
    }

    /// When the current negotiation round runs out, if one is running.
    pub fn negotiation_deadline(&self) -> Option<Instant> {
        if self.state != PeerState::Negotiating {
            return None;
        }
        Some(self.negotiating_since? + self.negotiation_timeout?)
    }

    /// Gives up on a negotiation that outlived its deadline.
    pub fn expire_negotiation(&mut self) {
        let Some(timeout) = self.negotiation_timeout else {
            return;
        };
        if self
            .negotiation_deadline()
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            self.fail(ControllerError::NegotiationTimeout(timeout));
        }
    }

    pub(crate) fn transport(&self) -> Arc<dyn PeerTransport> {
        self.transport.clone()
    }

    /// Sends the first offer. Only initiators in `Idle` do anything here.
    pub async fn start(&mut self) {
        if self.role != Role::Initiator || self.state != PeerState::Idle {
            return;
        }
        info!("Offering connection to {}", self.remote_id);
        if let Err(e) = self.send_offer().await {
            self.fail(e);
        }
    }

    pub async fn handle_command(&mut self, command: PeerCommand) {
        match command {
            PeerCommand::Signal(payload) => self.handle_signal(payload).await,
            PeerCommand::SetTrack { track, done } => {
                self.set_track(track).await;
                let _ = done.send(());
            }
        }
    }

    pub async fn handle_signal(&mut self, payload: Option<SignalPayload>) {
        if self.state.is_terminal() {
            debug!("Ignoring signal for {} peer {}", self.state, self.remote_id);
            return;
        }

        let result = match payload {
            None => {
                debug!("Flush marker from {}", self.remote_id);
                Ok(())
            }
            Some(SignalPayload::Offer { sdp }) => self.on_remote_offer(sdp).await,
            Some(SignalPayload::Answer { sdp }) => self.on_remote_answer(sdp).await,
            Some(SignalPayload::Candidate(candidate)) => {
                self.on_remote_candidate(candidate).await;
                Ok(())
            }
        };

        if let Err(e) = result {
            self.fail(e);
        }
    }

    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.state.is_terminal() {
            return;
        }

        match event {
            TransportEvent::LocalCandidate(candidate) => {
                if self.has_remote_description {
                    self.signals
                        .send_signal(&self.remote_id, SignalPayload::Candidate(candidate));
                } else {
                    self.local_candidates.enqueue(candidate);
                }
            }
            TransportEvent::ConnectionState(link) => self.on_link_state(link),
            TransportEvent::RemoteTrack(track) => {
                let _ = self.events.send(ControllerEvent::RemoteTrack {
                    peer_id: self.remote_id.clone(),
                    generation: self.generation,
                    track,
                });
            }
        }
    }

    /// Points the outbound audio at `track`. A track added where none existed
    /// needs a new offer; an in-place replacement does not.
    pub async fn set_track(&mut self, track: LocalTrack) {
        if self.state.is_terminal() {
            return;
        }

        match self.transport.attach_track(track).await {
            Ok(TrackAttachment::Replaced) => {
                debug!("Replaced outbound track for {}", self.remote_id);
            }
            Ok(TrackAttachment::Added) => {
                if self.offer_outstanding {
                    self.renegotiation_pending = true;
                } else if self.has_remote_description {
                    info!("Renegotiating with {} for new track", self.remote_id);
                    if let Err(e) = self.send_offer().await {
                        self.fail(e);
                    }
                }
            }
            Err(e) => warn!("Could not attach track for {}: {}", self.remote_id, e),
        }
    }

    async fn on_remote_offer(&mut self, sdp: String) -> Result<(), ControllerError> {
        if self.offer_outstanding {
            if self.local_id > self.remote_id {
                info!("Offer collision with {}: keeping ours", self.remote_id);
                return Ok(());
            }
            info!("Offer collision with {}: rolling back ours", self.remote_id);
            self.transport.rollback_local_offer().await?;
            self.offer_outstanding = false;
            // Gathered for the withdrawn offer.
            self.local_candidates.clear();
            // A rolled back renegotiation still has to happen.
            if self.has_remote_description {
                self.renegotiation_pending = true;
            }
        }

        self.set_state(PeerState::Negotiating);
        self.transport
            .apply_remote_description(SdpKind::Offer, sdp)
            .await?;
        self.remote_description_applied().await;

        let answer = self.transport.create_answer().await?;
        self.signals
            .send_signal(&self.remote_id, SignalPayload::Answer { sdp: answer });
        debug!("Answered offer from {}", self.remote_id);

        self.settle().await
    }

    async fn on_remote_answer(&mut self, sdp: String) -> Result<(), ControllerError> {
        if self.state != PeerState::Negotiating || !self.offer_outstanding {
            warn!(
                "Unexpected answer from {} while {}, ignoring",
                self.remote_id, self.state
            );
            return Ok(());
        }

        self.transport
            .apply_remote_description(SdpKind::Answer, sdp)
            .await?;
        self.offer_outstanding = false;
        self.remote_description_applied().await;

        self.settle().await
    }

    async fn on_remote_candidate(&mut self, candidate: IceCandidate) {
        if self.has_remote_description {
            self.apply_candidate(candidate).await;
        } else {
            self.remote_candidates.enqueue(candidate);
            debug!(
                "Queued candidate from {} ({} waiting)",
                self.remote_id,
                self.remote_candidates.len()
            );
        }
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.transport.add_remote_candidate(candidate).await {
            warn!("Skipping candidate from {}: {}", self.remote_id, e);
        }
    }

    async fn remote_description_applied(&mut self) {
        self.has_remote_description = true;

        let queued = self.remote_candidates.drain();
        if !queued.is_empty() {
            debug!(
                "Applying {} queued candidates from {}",
                queued.len(),
                self.remote_id
            );
        }
        for candidate in queued {
            self.apply_candidate(candidate).await;
        }

        for candidate in self.local_candidates.drain() {
            self.signals
                .send_signal(&self.remote_id, SignalPayload::Candidate(candidate));
        }
    }

    /// Runs after our side of an exchange is done.
    async fn settle(&mut self) -> Result<(), ControllerError> {
        if self.renegotiation_pending {
            self.renegotiation_pending = false;
            info!("Renegotiating with {}", self.remote_id);
            return self.send_offer().await;
        }
        // The transport does not re-announce an unchanged connected state.
        if self.transport_connected {
            self.set_state(PeerState::Connected);
        }
        Ok(())
    }

    async fn send_offer(&mut self) -> Result<(), ControllerError> {
        self.set_state(PeerState::Negotiating);
        let sdp = self.transport.create_offer().await?;
        self.offer_outstanding = true;
        self.signals
            .send_signal(&self.remote_id, SignalPayload::Offer { sdp });
        Ok(())
    }

    fn on_link_state(&mut self, link: LinkState) {
        self.transport_connected = link == LinkState::Connected;

        match link {
            LinkState::Connected => {
                let exchange_done = self.has_remote_description
                    && !self.offer_outstanding
                    && !self.renegotiation_pending;
                if self.state == PeerState::Negotiating && exchange_done {
                    self.set_state(PeerState::Connected);
                }
            }
            LinkState::Disconnected | LinkState::Failed => {
                warn!("Transport to {} reported {:?}", self.remote_id, link);
                self.set_state(PeerState::Failed);
                self.release_queues();
            }
            LinkState::Closed => {
                self.set_state(PeerState::Closed);
                self.release_queues();
            }
            LinkState::New | LinkState::Connecting => {}
        }
    }

    fn fail(&mut self, error: ControllerError) {
        warn!("Connection to {} failed: {}", self.remote_id, error);
        self.set_state(PeerState::Failed);
        self.release_queues();
    }

    fn release_queues(&mut self) {
        self.remote_candidates.clear();
        self.local_candidates.clear();
    }

    fn set_state(&mut self, state: PeerState) {
        if self.state == state {
            return;
        }
        debug!("Peer {}: {} -> {}", self.remote_id, self.state, state);
        self.state = state;
        self.negotiating_since = (state == PeerState::Negotiating).then(Instant::now);
        let _ = self.events.send(ControllerEvent::StateChanged {
            peer_id: self.remote_id.clone(),
            generation: self.generation,
            state,
        });
    }
}
