// ABOUTME: Extension point for PDUs the SMSC sends without being asked
// ABOUTME: Delivered messages, receipts and late responses reach the application through InboundHandler

use crate::codec::Frame;
use tokio::sync::mpsc;
use tracing::warn;

/// Receives every inbound PDU that does not answer a pending request.
///
/// Called on the session's read loop, so implementations must not block;
/// hand heavy work to another task. deliver_sm has already been
/// acknowledged when `handle` runs.
pub trait InboundHandler: Send + Sync {
    fn handle(&self, frame: Frame);
}

impl<F> InboundHandler for F
where
    F: Fn(Frame) + Send + Sync,
{
    fn handle(&self, frame: Frame) {
        self(frame)
    }
}

/// Forward inbound PDUs to a channel consumed by another task
pub fn channel_handler(tx: mpsc::UnboundedSender<Frame>) -> impl InboundHandler {
    move |frame: Frame| {
        if let Err(e) = tx.send(frame) {
            warn!(command_id = ?e.0.command_id(), "inbound receiver dropped, PDU discarded");
        }
    }
}
