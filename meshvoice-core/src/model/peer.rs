use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Relay-assigned connection id. Valid from connect until disconnect.
///
/// Ordering is byte-wise on the UUID, which matches lexicographic ordering of
/// the hyphenated lowercase form sent over the wire.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PeerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room member as advertised by the relay.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct PeerInfo {
    pub id: PeerId,
    pub username: String,
}

impl PeerInfo {
    pub fn new(id: PeerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}
