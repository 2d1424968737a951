use crate::domain::model::{DashboardEvent, Notification, NotificationLevel};
use tokio::sync::broadcast;

pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Fan-out channel for dashboard state changes. Renderers subscribe; the
/// dashboard never waits on them.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DashboardEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: DashboardEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Dashboard event dropped, no subscribers");
        }
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.publish(DashboardEvent::Notification(Notification::new(level, message)));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
