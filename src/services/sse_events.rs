use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::GameId,
    dto::{
        round::RoundSnapshot,
        sse::{ConnectivityEvent, RoundClosedEvent, ServerEvent, StorageNoticeEvent, SyncReport},
    },
    state::SseHub,
};

const EVENT_ROUND_UPDATED: &str = "round.updated";
const EVENT_ROUND_CLOSED: &str = "round.closed";
const EVENT_SAVED_LOCALLY: &str = "storage.saved_locally";
const EVENT_LOCAL_WRITE_FAILED: &str = "storage.local_write_failed";
const EVENT_OFFLINE: &str = "connectivity.offline";
const EVENT_ONLINE: &str = "connectivity.online";
const EVENT_SYNC_COMPLETED: &str = "sync.completed";

/// Push the new state of a live round to its owner.
pub fn broadcast_round_updated(hub: &SseHub, owner_id: &str, snapshot: &RoundSnapshot) {
    send_owner_event(hub, owner_id, EVENT_ROUND_UPDATED, snapshot);
}

/// Tell the owner a round was saved and released.
pub fn broadcast_round_closed(hub: &SseHub, owner_id: &str, round_id: Uuid, game_id: Option<GameId>) {
    let payload = RoundClosedEvent {
        round_id,
        game_id: game_id.map(|id| id.to_string()),
    };
    send_owner_event(hub, owner_id, EVENT_ROUND_CLOSED, &payload);
}

/// A save only reached the local store.
pub fn broadcast_saved_locally(hub: &SseHub, owner_id: &str, game_id: GameId) {
    let payload = StorageNoticeEvent {
        game_id: game_id.to_string(),
        message: "Saved on this device. It will sync once the server is reachable.".into(),
    };
    send_owner_event(hub, owner_id, EVENT_SAVED_LOCALLY, &payload);
}

/// Neither store accepted a save; the change only lives in memory.
pub fn broadcast_local_write_failed(hub: &SseHub, owner_id: &str, game_id: GameId) {
    let payload = StorageNoticeEvent {
        game_id: game_id.to_string(),
        message: "Could not save this game, not even on this device.".into(),
    };
    send_owner_event(hub, owner_id, EVENT_LOCAL_WRITE_FAILED, &payload);
}

/// Broadcast a remote store connectivity change to every subscriber.
pub fn broadcast_connectivity(hub: &SseHub, online: bool) {
    let (event, message) = if online {
        (EVENT_ONLINE, "Back online. Local changes will sync.")
    } else {
        (EVENT_OFFLINE, "You're offline. Changes are saved on this device.")
    };
    let payload = ConnectivityEvent {
        online,
        message: message.into(),
    };
    send_event(hub, event, &payload);
}

/// Broadcast the outcome of a reconciliation pass.
pub fn broadcast_sync_completed(hub: &SseHub, report: SyncReport) {
    send_event(hub, EVENT_SYNC_COMPLETED, &report);
}

fn send_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

fn send_owner_event(hub: &SseHub, owner_id: &str, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event.for_owner(owner_id)),
        Err(err) => warn!(event, error = %err, "failed to serialize owner SSE payload"),
    }
}
