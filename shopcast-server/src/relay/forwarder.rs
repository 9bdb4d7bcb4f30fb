use crate::transport::{InboundTrack, PacketSink};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Copies packets from `source` to `sink` unmodified, in order, until the
/// source ends or `cancel` fires. Resolves to the number of packets written.
///
/// The sink fans out to every viewer of the room, so a failed write only means
/// some binding rejected that packet; forwarding goes on.
pub fn spawn_forwarder(
    source: Arc<dyn InboundTrack>,
    sink: Arc<dyn PacketSink>,
    cancel: CancellationToken,
) -> JoinHandle<u64> {
    tokio::spawn(async move { forward(source, sink, cancel).await })
}

async fn forward(
    source: Arc<dyn InboundTrack>,
    sink: Arc<dyn PacketSink>,
    cancel: CancellationToken,
) -> u64 {
    let track_id = source.id();
    let mut forwarded = 0u64;
    let mut failed = 0u64;

    loop {
        let packet = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(track = %track_id, forwarded, failed, "Forwarder cancelled");
                break;
            }
            read = source.read_packet() => match read {
                Ok(packet) => packet,
                Err(e) => {
                    debug!(track = %track_id, forwarded, failed, "Inbound track ended: {}", e);
                    break;
                }
            },
        };

        match sink.write_packet(&packet).await {
            Ok(()) => forwarded += 1,
            Err(e) => {
                failed += 1;
                debug!(track = %track_id, failed, "Forwarding write failed: {}", e);
            }
        }
    }

    forwarded
}
