use clap::Parser;
use shopcast_server::{SfuConfig, TransportConfig};
use std::time::Duration;

/// Selective forwarding unit and signaling gateway for live shopping rooms.
#[derive(Debug, Parser)]
#[command(name = "shopcast-sfu", version)]
pub struct Cli {
    /// Address the HTTP/WebSocket server listens on.
    #[arg(long, env = "SFU_BIND", default_value = "0.0.0.0:8188")]
    pub bind: String,

    #[arg(long, env = "SFU_WS_PATH", default_value = "/ws")]
    pub ws_path: String,

    /// STUN server URLs, comma separated. Defaults to the public Google and Twilio servers.
    #[arg(long = "stun", env = "SFU_STUN_SERVERS", value_delimiter = ',')]
    pub stun_servers: Vec<String>,

    #[arg(long, env = "TURN_SERVER_URL")]
    pub turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME", default_value = "")]
    pub turn_username: String,

    #[arg(long, env = "TURN_PASSWORD", default_value = "", hide_env_values = true)]
    pub turn_password: String,

    #[arg(long, default_value_t = 30)]
    pub reaper_interval_secs: u64,

    #[arg(long, default_value_t = 60)]
    pub liveness_timeout_secs: u64,

    /// How long an empty room is kept before it is forgotten.
    #[arg(long, default_value_t = 3600)]
    pub room_idle_ttl_secs: u64,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn sfu_config(&self) -> SfuConfig {
        let mut transport = if self.stun_servers.is_empty() {
            TransportConfig::default()
        } else {
            TransportConfig::from_stun_urls(
                self.stun_servers
                    .iter()
                    .map(|url| url.trim())
                    .filter(|url| !url.is_empty()),
            )
        };
        if let Some(url) = &self.turn_url {
            transport = transport.with_turn(url, &self.turn_username, &self.turn_password);
        }

        SfuConfig {
            ws_path: self.ws_path.clone(),
            transport,
            reaper_interval: Duration::from_secs(self.reaper_interval_secs),
            liveness_timeout: Duration::from_secs(self.liveness_timeout_secs),
            room_idle_ttl: Duration::from_secs(self.room_idle_ttl_secs),
        }
    }
}
