use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Default number of buffered events per subscriber before it starts lagging.
pub const DEFAULT_EVENTS_CAPACITY: usize = 64;

/// Broadcast hub fanning server events out to every SSE subscriber.
///
/// Cloning is cheap and every clone feeds the same channel, so the
/// persistence gateway can publish notices without holding the app state.
#[derive(Clone)]
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for SseHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENTS_CAPACITY)
    }
}
