use tokio::sync::broadcast;
use tracing::debug;

use shared_models::events::DomainEvent;

pub type EventReceiver = broadcast::Receiver<DomainEvent>;

/// In-process fan-out of domain events. Publishing never blocks and never
/// fails the publisher; slow subscribers observe `RecvError::Lagged`.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!("Published {} to {} subscriber(s)", name, receivers),
            Err(_) => debug!("Published {} with no active subscribers", name),
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use shared_models::staff::TaskStatus;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut receiver = bus.subscribe();

        let event = DomainEvent::TaskStatusChanged {
            task_id: Uuid::new_v4(),
            clinic_id: Uuid::new_v4(),
            status: TaskStatus::Accepted,
        };
        bus.publish(event.clone());

        assert_eq!(receiver.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(DomainEvent::BookingConflict {
            clinic_id: Uuid::new_v4(),
            date: chrono::NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            time: chrono::NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        });
    }
}
