//! Signaling relay for the meshvoice audio mesh.
//!
//! The relay never touches media. It assigns connection ids, tracks which
//! connections sit in which room, and forwards opaque `signal` bodies between
//! two ids.

mod config;
mod relay;
mod room;
mod signaling;

pub use config::*;
pub use relay::*;
pub use room::*;
pub use signaling::*;
