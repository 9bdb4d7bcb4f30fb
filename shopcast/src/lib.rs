pub use shopcast_core::model::{PeerId, Role, RoomId};

pub mod model {
    pub use shopcast_core::model::*;
    pub use shopcast_core::EnvelopeError;
}

pub mod server {
    pub use shopcast_server::*;
}

pub mod cli;
