use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{routes::identity::OwnerId, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/events",
    tag = "sse",
    params(("x-owner-id" = String, Header, description = "Owner identity")),
    responses(
        (status = 200, description = "Round updates and storage notices", content_type = "text/event-stream", body = String),
        (status = 401, description = "Missing owner identity")
    )
)]
/// Stream round updates, storage notices and connectivity changes to the owner.
pub async fn event_stream(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!(owner_id = %owner_id, "new SSE connection");
    sse_service::to_sse_stream(state.is_degraded(), receiver, owner_id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/events", get(event_stream))
}
