mod media_session;
mod media_track;
mod session_event;
mod transport_config;
mod webrtc_session;

pub use media_session::*;
pub use media_track::*;
pub use session_event::*;
pub use transport_config::*;
pub use webrtc_session::*;
