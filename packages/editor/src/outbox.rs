use songframe_protocol::HostEvent;
use tokio::sync::mpsc;

/// Outbound half of the host channel
///
/// Events are fire-and-forget: once the host side is gone they are dropped.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: HostEvent) {
        tracing::debug!("[Outbox] {}", event.kind());
        if self.tx.send(event).is_err() {
            tracing::debug!("[Outbox] host detached, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_preserves_order() {
        let (outbox, mut rx) = Outbox::channel();
        outbox.emit(HostEvent::Ready);
        outbox.emit(HostEvent::DocDirty);

        assert_eq!(rx.try_recv().unwrap(), HostEvent::Ready);
        assert_eq!(rx.try_recv().unwrap(), HostEvent::DocDirty);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_after_host_detached_is_silent() {
        let (outbox, rx) = Outbox::channel();
        drop(rx);
        outbox.emit(HostEvent::Ready);
    }
}
