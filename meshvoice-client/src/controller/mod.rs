mod controller_event;
mod controller_handle;
mod peer_command;
mod peer_controller;
mod peer_state;

pub use controller_event::*;
pub use controller_handle::*;
pub use peer_command::*;
pub use peer_controller::*;
pub use peer_state::*;
