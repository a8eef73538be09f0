use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use meshvoice_core::{PeerId, ServerMessage};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

struct Connection {
    tx: mpsc::UnboundedSender<ServerMessage>,
    rooms: BTreeSet<String>,
}

struct SignalingInner {
    peers: DashMap<PeerId, Connection>,
}

/// Registry of live relay connections.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.inner.peers.insert(
            peer_id,
            Connection {
                tx,
                rooms: BTreeSet::new(),
            },
        );
    }

    /// Drops the connection and returns every room it had joined.
    pub fn remove_peer(&self, peer_id: &PeerId) -> Option<BTreeSet<String>> {
        self.inner
            .peers
            .remove(peer_id)
            .map(|(_, connection)| connection.rooms)
    }

    pub fn is_connected(&self, peer_id: &PeerId) -> bool {
        self.inner.peers.contains_key(peer_id)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.peers.len()
    }

    /// Returns `false` if the peer disconnected in the meantime.
    pub fn record_room(&self, peer_id: &PeerId, room: &str) -> bool {
        match self.inner.peers.get_mut(peer_id) {
            Some(mut connection) => {
                connection.rooms.insert(room.to_owned());
                true
            }
            None => false,
        }
    }

    pub fn forget_room(&self, peer_id: &PeerId, room: &str) {
        if let Some(mut connection) = self.inner.peers.get_mut(peer_id) {
            connection.rooms.remove(room);
        }
    }

    pub fn send_signal(&self, peer_id: &PeerId, msg: ServerMessage) -> bool {
        let Some(peer) = self.inner.peers.get(peer_id) else {
            debug!("Dropping frame for disconnected peer {}", peer_id);
            return false;
        };
        if let Err(e) = peer.tx.send(msg) {
            error!("Failed to queue frame for {}: {}", peer_id, e);
            return false;
        }
        true
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingOutput for SignalingService {
    fn send(&self, peer_id: &PeerId, msg: ServerMessage) -> bool {
        self.send_signal(peer_id, msg)
    }
}
