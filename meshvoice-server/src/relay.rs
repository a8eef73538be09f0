use crate::config::RelayConfig;
use crate::room::RoomManager;
use crate::signaling::SignalingService;
use meshvoice_core::{ClientMessage, PeerId, PeerInfo, ServerMessage, resolve_display_name};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Process-wide signaling relay: connection registry plus room membership.
///
/// Cheap to clone; every clone shares the same state.
#[derive(Clone)]
pub struct Relay {
    signaling: SignalingService,
    rooms: RoomManager,
    config: Arc<RelayConfig>,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        let signaling = SignalingService::new();
        let rooms = RoomManager::new(Arc::new(signaling.clone()));
        Self {
            signaling,
            rooms,
            config: Arc::new(config),
        }
    }

    /// Registers a connection and greets it with its id (and ICE config, if any).
    pub fn connect(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> PeerId {
        let peer_id = PeerId::new();
        self.signaling.add_peer(peer_id.clone(), tx);
        self.signaling.send_signal(
            &peer_id,
            ServerMessage::Welcome {
                id: peer_id.clone(),
            },
        );
        if !self.config.ice_servers.is_empty() {
            self.signaling.send_signal(
                &peer_id,
                ServerMessage::IceConfig {
                    ice_servers: self.config.ice_servers.clone(),
                },
            );
        }
        info!("Peer {} connected", peer_id);
        peer_id
    }

    pub fn join(&self, peer_id: &PeerId, room: &str, username: Option<&str>) -> Vec<PeerInfo> {
        if !self.signaling.record_room(peer_id, room) {
            debug!("Ignoring join of '{}' from disconnected peer {}", room, peer_id);
            return Vec::new();
        }
        let peer = PeerInfo::new(peer_id.clone(), resolve_display_name(username));
        let existing = self.rooms.join(room, peer);

        // A disconnect that ran between `record_room` and the insert above did
        // not see this room yet; undo the insert so no ghost member stays.
        if !self.signaling.is_connected(peer_id) {
            debug!("Peer {} disconnected while joining '{}'", peer_id, room);
            self.rooms.leave(room, peer_id);
            return Vec::new();
        }
        existing
    }

    pub fn leave(&self, peer_id: &PeerId, room: &str) {
        self.signaling.forget_room(peer_id, room);
        self.rooms.leave(room, peer_id);
    }

    /// Forwards `signal` to `to` untouched; silently dropped if `to` is gone.
    pub fn relay_signal(&self, from: &PeerId, to: &PeerId, signal: Value) {
        let delivered = self.signaling.send_signal(
            to,
            ServerMessage::Signal {
                from: from.clone(),
                signal,
            },
        );
        if delivered {
            debug!("Relayed signal {} -> {}", from, to);
        }
    }

    /// Drops the connection and announces the departure in every joined room.
    pub fn disconnect(&self, peer_id: &PeerId) {
        let Some(rooms) = self.signaling.remove_peer(peer_id) else {
            return;
        };
        for room in &rooms {
            self.rooms.leave(room, peer_id);
        }
        info!("Peer {} disconnected ({} rooms)", peer_id, rooms.len());
    }

    pub fn handle_client_message(&self, peer_id: &PeerId, msg: ClientMessage) {
        match msg {
            ClientMessage::JoinRoom { room, username } => {
                self.join(peer_id, &room, username.as_deref());
            }
            ClientMessage::LeaveRoom { room } => self.leave(peer_id, &room),
            ClientMessage::Signal { to, signal } => self.relay_signal(peer_id, &to, signal),
        }
    }

    pub fn members(&self, room: &str) -> Vec<PeerInfo> {
        self.rooms.members(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    pub fn connection_count(&self) -> usize {
        self.signaling.connection_count()
    }

    pub fn is_connected(&self, peer_id: &PeerId) -> bool {
        self.signaling.is_connected(peer_id)
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}
