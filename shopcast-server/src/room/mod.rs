mod peer_session;
mod room;
mod room_registry;

pub use peer_session::*;
pub use room::*;
pub use room_registry::*;
