mod relay_connector;
mod signal_sink;
mod ws_connector;

pub use relay_connector::*;
pub use signal_sink::*;
pub use ws_connector::*;
