use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Locally saved records still waiting for the remote store.
    pub pending_sync: usize,
}

impl HealthResponse {
    /// Create a health response indicating the remote store is reachable.
    pub fn ok(pending_sync: usize) -> Self {
        Self {
            status: "ok".to_string(),
            pending_sync,
        }
    }

    /// Create a health response indicating saves only reach the local store.
    pub fn degraded(pending_sync: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            pending_sync,
        }
    }
}
