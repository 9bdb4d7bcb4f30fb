pub mod config;
pub mod http;
pub mod reaper;
pub mod relay;
pub mod room;
pub mod signaling;
pub mod transport;
pub mod viewer_count;

pub use config::SfuConfig;
pub use http::router;
pub use reaper::Reaper;
pub use relay::*;
pub use room::*;
pub use signaling::*;
pub use transport::*;
pub use viewer_count::*;
