use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether saves reach the remote store and how much is waiting to sync.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let pending = state.gateway().pending_count().await;

    if state.is_degraded() {
        HealthResponse::degraded(pending)
    } else {
        HealthResponse::ok(pending)
    }
}
