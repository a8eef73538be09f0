//! Participant side of a mesh voice room.
//!
//! A [`RoomSession`] talks to the relay, and keeps one [`PeerController`] per
//! remote participant. Each controller drives its own [`PeerTransport`].

mod candidate_queue;
mod config;
mod controller;
mod error;
mod media;
mod session;
mod signaling;
mod transport;

pub use candidate_queue::*;
pub use config::*;
pub use controller::*;
pub use error::*;
pub use media::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
