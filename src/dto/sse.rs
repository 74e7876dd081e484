use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
    /// Owner the event is addressed to; `None` reaches every subscriber.
    pub owner_id: Option<String>,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
            owner_id: None,
        })
    }

    /// Restrict delivery to a single owner's streams.
    pub fn for_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Whether a stream opened by `owner_id` should receive this event.
    pub fn is_visible_to(&self, owner_id: &str) -> bool {
        self.owner_id
            .as_deref()
            .is_none_or(|target| target == owner_id)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Owner the stream is scoped to.
    pub owner_id: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the remote store is currently unreachable.
    pub offline: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the remote store becomes reachable or unreachable.
pub struct ConnectivityEvent {
    pub online: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a save had to fall back to the local store, or even that failed.
pub struct StorageNoticeEvent {
    /// Identifier the record was (or would have been) saved under.
    pub game_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
/// Outcome of replaying locally saved records to the remote store.
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
}

impl SyncReport {
    /// Whether any record was attempted.
    pub fn is_empty(&self) -> bool {
        self.synced == 0 && self.failed == 0
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a live round is saved and closed.
pub struct RoundClosedEvent {
    pub round_id: Uuid,
    pub game_id: Option<String>,
}
