use crate::config::SessionConfig;
use crate::controller::{
    ControllerEvent, ControllerHandle, PeerCommand, PeerController, PeerState, Role,
};
use crate::media::MediaSource;
use crate::session::{PeerSummary, SessionCommand, SessionEvent};
use crate::signaling::{RelaySink, SignalSink};
use crate::transport::{LocalTrack, PeerTransport, TransportFactory};
use meshvoice_core::{ClientMessage, IceServerConfig, PeerId, PeerInfo, ServerMessage, SignalPayload};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Everything needed to start the event loop of a joined session.
pub(crate) struct SessionParts {
    pub local_id: PeerId,
    pub room: String,
    pub config: SessionConfig,
    pub factory: Arc<dyn TransportFactory>,
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub relay_rx: mpsc::UnboundedReceiver<ServerMessage>,
    pub command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    pub media: Box<dyn MediaSource>,
    pub local_track: LocalTrack,
    pub events: mpsc::UnboundedSender<SessionEvent>,
}

/// Single task owning every controller handle of a session.
///
/// Relay frames, controller reports and session commands are handled one at a
/// time; each controller does its own negotiation on its own task.
pub(crate) struct SessionLoop {
    local_id: PeerId,
    room: String,
    config: SessionConfig,
    ice_servers: Vec<IceServerConfig>,
    factory: Arc<dyn TransportFactory>,
    outbound: Option<mpsc::UnboundedSender<ClientMessage>>,
    sink: Arc<dyn SignalSink>,
    relay_rx: mpsc::UnboundedReceiver<ServerMessage>,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    controller_tx: mpsc::UnboundedSender<ControllerEvent>,
    controller_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    controllers: HashMap<PeerId, ControllerHandle>,
    /// Display names of everyone the relay told us about.
    names: HashMap<PeerId, String>,
    local_track: Option<LocalTrack>,
    media: Box<dyn MediaSource>,
    events: mpsc::UnboundedSender<SessionEvent>,
    next_generation: u64,
}

impl SessionLoop {
    pub(crate) fn new(parts: SessionParts) -> Self {
        let (controller_tx, controller_rx) = mpsc::unbounded_channel();
        let sink: Arc<dyn SignalSink> = Arc::new(RelaySink::new(parts.outbound.clone()));

        Self {
            local_id: parts.local_id,
            room: parts.room,
            ice_servers: parts.config.ice_servers.clone(),
            config: parts.config,
            factory: parts.factory,
            outbound: Some(parts.outbound),
            sink,
            relay_rx: parts.relay_rx,
            command_rx: parts.command_rx,
            controller_tx,
            controller_rx,
            controllers: HashMap::new(),
            names: HashMap::new(),
            local_track: Some(parts.local_track),
            media: parts.media,
            events: parts.events,
            next_generation: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        info!("Session event loop started for room '{}'", self.room);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if self.handle_command(c).await {
                                break;
                            }
                        }
                        None => {
                            debug!("Session handle dropped, leaving");
                            self.leave().await;
                            break;
                        }
                    }
                }

                frame = self.relay_rx.recv() => {
                    match frame {
                        Some(msg) => self.handle_server_message(msg).await,
                        None => {
                            warn!("Relay connection lost");
                            self.teardown().await;
                            let _ = self.events.send(SessionEvent::RelayDisconnected);
                            break;
                        }
                    }
                }

                Some(evt) = self.controller_rx.recv() => {
                    self.handle_controller_event(evt).await;
                }
            }
        }

        info!("Session event loop finished");
    }

    /// Returns true once the session has left its room.
    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::SetLocalTrack { track, done } => {
                self.local_track = Some(track.clone());

                let mut acks = Vec::new();
                for handle in self.controllers.values() {
                    let (tx, rx) = oneshot::channel();
                    if handle.send(PeerCommand::SetTrack {
                        track: track.clone(),
                        done: tx,
                    }) {
                        acks.push(rx);
                    }
                }
                debug!("Propagating local track to {} peers", acks.len());

                // A controller that dies first drops its ack, which counts as done.
                tokio::spawn(async move {
                    futures::future::join_all(acks).await;
                    let _ = done.send(());
                });
            }
            SessionCommand::Peers(reply) => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::Leave(done) => {
                self.leave().await;
                let _ = done.send(());
                return true;
            }
        }
        false
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { id } => debug!("Ignoring repeated welcome ({})", id),
            ServerMessage::IceConfig { ice_servers } => {
                if !ice_servers.is_empty() {
                    info!("Relay advertised {} ICE servers", ice_servers.len());
                    self.ice_servers = ice_servers;
                }
            }
            ServerMessage::ExistingPeers(peers) => {
                info!("{} peers already in '{}'", peers.len(), self.room);
                for peer in peers {
                    if peer.id == self.local_id {
                        continue;
                    }
                    let id = peer.id.clone();
                    self.note_peer(peer);
                    self.spawn_controller(&id, Role::Initiator).await;
                }
            }
            ServerMessage::NewPeer(peer) => {
                if peer.id == self.local_id {
                    return;
                }
                info!("{} ({}) joined '{}'", peer.username, peer.id, self.room);
                let id = peer.id.clone();
                self.note_peer(peer);
                if self.config.initiate_on_peer_joined {
                    self.spawn_controller(&id, Role::Initiator).await;
                }
            }
            ServerMessage::Signal { from, signal } => self.route_signal(from, signal).await,
            ServerMessage::PeerDisconnect { id } => {
                let known = self.names.remove(&id).is_some();
                let had_controller = self.destroy_controller(&id).await;
                if known || had_controller {
                    info!("Peer {} left '{}'", id, self.room);
                    let _ = self.events.send(SessionEvent::PeerLeft { id });
                }
            }
        }
    }

    async fn route_signal(&mut self, from: PeerId, signal: Value) {
        let payload = match SignalPayload::decode(signal) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Malformed signal from {}: {}", from, e);
                return;
            }
        };

        // A finished task means its record is terminal; let a fresh one take over.
        if self.controllers.get(&from).is_some_and(|h| h.is_finished()) {
            self.destroy_controller(&from).await;
        }

        if !self.controllers.contains_key(&from) {
            match &payload {
                Some(SignalPayload::Offer { .. }) => {
                    if !self.spawn_controller(&from, Role::Responder).await {
                        return;
                    }
                }
                other => {
                    let kind = other.as_ref().map_or("flush", |p| p.kind_name());
                    debug!("Ignoring {} from unknown peer {}", kind, from);
                    return;
                }
            }
        }

        if let Some(handle) = self.controllers.get(&from) {
            handle.send(PeerCommand::Signal(payload));
        }
    }

    async fn handle_controller_event(&mut self, event: ControllerEvent) {
        let Some(handle) = self.controllers.get_mut(event.peer_id()) else {
            return;
        };
        if handle.generation != event.generation() {
            debug!("Dropping report from a replaced controller for {}", event.peer_id());
            return;
        }

        match event {
            ControllerEvent::StateChanged { peer_id, state, .. } => {
                handle.state = state;
                let _ = self.events.send(SessionEvent::PeerStateChanged {
                    id: peer_id.clone(),
                    state,
                });
                if state.is_terminal() {
                    self.destroy_controller(&peer_id).await;
                }
            }
            ControllerEvent::RemoteTrack { peer_id, track, .. } => {
                let _ = self
                    .events
                    .send(SessionEvent::RemoteTrack { id: peer_id, track });
            }
        }
    }

    fn note_peer(&mut self, peer: PeerInfo) {
        let _ = self.events.send(SessionEvent::PeerJoined {
            id: peer.id.clone(),
            display_name: peer.username.clone(),
        });
        self.names.insert(peer.id, peer.username);
    }

    /// Creates the controller for `peer_id` unless one already exists.
    async fn spawn_controller(&mut self, peer_id: &PeerId, role: Role) -> bool {
        if self.controllers.contains_key(peer_id) {
            return true;
        }

        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let transport: Arc<dyn PeerTransport> =
            match self.factory.create(peer_id, &self.ice_servers, transport_tx).await {
                Ok(transport) => Arc::from(transport),
                Err(e) => {
                    warn!("No transport for {}: {}", peer_id, e);
                    let _ = self.events.send(SessionEvent::PeerStateChanged {
                        id: peer_id.clone(),
                        state: PeerState::Failed,
                    });
                    return false;
                }
            };

        self.next_generation += 1;
        let controller = PeerController::new(
            self.local_id.clone(),
            peer_id.clone(),
            role,
            transport,
            self.sink.clone(),
            self.controller_tx.clone(),
        )
        .with_generation(self.next_generation)
        .with_negotiation_timeout(self.config.negotiation_timeout);

        let handle = ControllerHandle::spawn(controller, transport_rx, self.local_track.clone());
        self.controllers.insert(peer_id.clone(), handle);
        info!("Created {} controller for {}", role, peer_id);
        true
    }

    /// Stops and forgets the controller for `peer_id`. A second call is a no-op.
    async fn destroy_controller(&mut self, peer_id: &PeerId) -> bool {
        let Some(handle) = self.controllers.remove(peer_id) else {
            return false;
        };
        let was_live = !handle.state.is_terminal();
        handle.shutdown().await;

        if was_live {
            let _ = self.events.send(SessionEvent::PeerStateChanged {
                id: peer_id.clone(),
                state: PeerState::Closed,
            });
        }
        debug!("Released connection to {}", peer_id);
        true
    }

    async fn leave(&mut self) {
        if let Some(outbound) = &self.outbound {
            let _ = outbound.send(ClientMessage::LeaveRoom {
                room: self.room.clone(),
            });
        }
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        let ids: Vec<PeerId> = self.controllers.keys().cloned().collect();
        for id in ids {
            self.destroy_controller(&id).await;
        }
        self.names.clear();
        self.local_track = None;
        self.media.release().await;
        // The relay connection closes once the last sender is gone.
        self.outbound = None;
    }

    fn snapshot(&self) -> Vec<PeerSummary> {
        let mut peers: Vec<PeerSummary> = self
            .controllers
            .iter()
            .map(|(id, handle)| PeerSummary {
                id: id.clone(),
                display_name: self.names.get(id).cloned(),
                role: handle.role,
                state: handle.state,
            })
            .collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        peers
    }
}
