use meshvoice_core::{PeerId, PeerInfo};
use std::collections::HashMap;

/// Membership of one named room.
#[derive(Debug, Default)]
pub struct Room {
    name: String,
    members: HashMap<PeerId, String>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `peer`, overwriting the display name of a repeated join.
    pub fn insert(&mut self, peer: PeerInfo) {
        self.members.insert(peer.id, peer.username);
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> bool {
        self.members.remove(peer_id).is_some()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.members.contains_key(peer_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &PeerId> {
        self.members.keys()
    }

    pub fn snapshot_excluding(&self, peer_id: &PeerId) -> Vec<PeerInfo> {
        self.members
            .iter()
            .filter(|(id, _)| *id != peer_id)
            .map(|(id, username)| PeerInfo::new(id.clone(), username.clone()))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<PeerInfo> {
        self.members
            .iter()
            .map(|(id, username)| PeerInfo::new(id.clone(), username.clone()))
            .collect()
    }
}
