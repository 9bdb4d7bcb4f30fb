use crate::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime settings of the SFU, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SfuConfig {
    /// Route the WebSocket endpoint is mounted on.
    pub ws_path: String,
    pub transport: TransportConfig,
    /// Period of the liveness sweep.
    pub reaper_interval: Duration,
    /// A connection with no inbound frame for this long fails the liveness check.
    pub liveness_timeout: Duration,
    /// How long an empty room is kept before it is dropped from the registry.
    pub room_idle_ttl: Duration,
}

impl Default for SfuConfig {
    fn default() -> Self {
        let reaper_interval = Duration::from_secs(30);
        Self {
            ws_path: "/ws".to_owned(),
            transport: TransportConfig::default(),
            reaper_interval,
            liveness_timeout: reaper_interval * 2,
            room_idle_ttl: Duration::from_secs(3600),
        }
    }
}
