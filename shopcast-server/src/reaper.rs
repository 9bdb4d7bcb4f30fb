use crate::signaling::SignalingService;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodically evicts peers whose connection fails the liveness check.
///
/// Rooms emptied by a sweep are only scheduled for idle removal; the reaper
/// never deletes rooms itself.
pub struct Reaper {
    service: SignalingService,
    interval: Duration,
    liveness_timeout: Duration,
}

impl Reaper {
    pub fn new(service: SignalingService) -> Self {
        let config = service.config();
        let interval = config.reaper_interval;
        let liveness_timeout = config.liveness_timeout;
        Self {
            service,
            interval,
            liveness_timeout,
        }
    }

    /// Runs one pass over every room; returns how many peers were evicted.
    pub async fn sweep(&self) -> usize {
        let mut evicted = 0;

        for room in self.service.registry().rooms() {
            let departure = room.remove_unresponsive(self.liveness_timeout).await;
            if departure.is_empty() {
                continue;
            }
            evicted += departure.removed.len();
            self.service.settle(&room, departure).await;
        }

        if evicted > 0 {
            info!(evicted, "Reaped unresponsive peers");
        }
        evicted
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
        debug!("Reaper stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
