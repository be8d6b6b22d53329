use tokio::sync::broadcast;
use wallet_core::event::{Notification, WalletEvent};

const CHANNEL_CAPACITY: usize = 256;

/// Publish/subscribe channel for [`WalletEvent`]s.
///
/// Publishing never fails: with no subscribers the event is dropped, and a
/// slow subscriber only loses its own oldest events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WalletEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: WalletEvent) {
        tracing::trace!("[EventBus] {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn notify(&self, notification: Notification) {
        self.publish(WalletEvent::Notification { notification });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_core::verification::VerificationStatus;

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(WalletEvent::VerificationChanged {
            status: VerificationStatus::Pending,
        });
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(WalletEvent::VerificationChanged {
            status: VerificationStatus::Pending,
        });
        bus.publish(WalletEvent::VerificationChanged {
            status: VerificationStatus::Processing,
        });
        assert_eq!(
            rx.try_recv().unwrap(),
            WalletEvent::VerificationChanged {
                status: VerificationStatus::Pending
            }
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            WalletEvent::VerificationChanged {
                status: VerificationStatus::Processing
            }
        ));
    }
}
