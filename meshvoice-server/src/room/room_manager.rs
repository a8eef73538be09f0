use crate::room::Room;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use meshvoice_core::{PeerId, PeerInfo, ServerMessage};
use std::sync::Arc;
use tracing::{debug, info};

/// Owns every live room.
///
/// Each mutation runs while holding the room's map entry, so join, leave and
/// the broadcasts they trigger are serialized per room.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<String, Room>>,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
        }
    }

    /// Adds `peer` to `room_name` and returns the members that were already
    /// there. The joiner gets `existing-peers` before anyone else hears about it.
    pub fn join(&self, room_name: &str, peer: PeerInfo) -> Vec<PeerInfo> {
        let mut room = self
            .rooms
            .entry(room_name.to_owned())
            .or_insert_with(|| {
                info!("Creating new room: {}", room_name);
                Room::new(room_name)
            });

        let existing = room.snapshot_excluding(&peer.id);
        self.signaling
            .send(&peer.id, ServerMessage::ExistingPeers(existing.clone()));

        for member in &existing {
            self.signaling
                .send(&member.id, ServerMessage::NewPeer(peer.clone()));
        }

        info!(
            "Peer {} ({}) joined room '{}' with {} existing members",
            peer.id,
            peer.username,
            room.name(),
            existing.len()
        );
        room.insert(peer);
        existing
    }

    /// Removes `peer_id` from `room_name` and tells the remaining members.
    pub fn leave(&self, room_name: &str, peer_id: &PeerId) -> bool {
        let removed = {
            let Some(mut room) = self.rooms.get_mut(room_name) else {
                return false;
            };
            let removed = room.remove(peer_id);
            if removed {
                for member in room.member_ids() {
                    self.signaling.send(
                        member,
                        ServerMessage::PeerDisconnect {
                            id: peer_id.clone(),
                        },
                    );
                }
                info!("Peer {} left room '{}'", peer_id, room.name());
            }
            removed
        };

        if self
            .rooms
            .remove_if(room_name, |_, room| room.is_empty())
            .is_some()
        {
            debug!("Room '{}' is empty, dropping it", room_name);
        }

        removed
    }

    pub fn members(&self, room_name: &str) -> Vec<PeerInfo> {
        self.rooms
            .get(room_name)
            .map(|room| room.snapshot())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
