mod forwarder;
mod track_relay;

pub use forwarder::*;
pub use track_relay::*;
