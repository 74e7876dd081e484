use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::round::{JumpRequest, RoundSnapshot, ScoreRequest, StandingEntry},
    error::AppError,
    routes::identity::OwnerId,
    services::round_service,
    state::{SharedState, round::RoundEvent},
};

/// Routes driving a live round: navigation, scoring and saving.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rounds/{id}", get(get_round))
        .route("/rounds/{id}/advance", post(advance))
        .route("/rounds/{id}/retreat", post(retreat))
        .route("/rounds/{id}/jump", post(jump))
        .route("/rounds/{id}/scores", put(set_score))
        .route("/rounds/{id}/standings", get(standings))
        .route("/rounds/{id}/save", post(save_and_exit))
}

/// Current state of a live round.
#[utoipa::path(
    get,
    path = "/rounds/{id}",
    tag = "round",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    responses(
        (status = 200, description = "Round state", body = RoundSnapshot),
        (status = 404, description = "Unknown round")
    )
)]
pub async fn get_round(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(round_service::snapshot(&state, &owner_id, id).await?))
}

/// Move to the next hole; completes the round after the last one.
#[utoipa::path(
    post,
    path = "/rounds/{id}/advance",
    tag = "round",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    responses(
        (status = 200, description = "Round state", body = RoundSnapshot),
        (status = 409, description = "Round already completed")
    )
)]
pub async fn advance(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::apply_event(&state, &owner_id, id, RoundEvent::Advance).await?;
    Ok(Json(snapshot))
}

/// Move back one hole.
#[utoipa::path(
    post,
    path = "/rounds/{id}/retreat",
    tag = "round",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    responses(
        (status = 200, description = "Round state", body = RoundSnapshot),
        (status = 409, description = "Round already completed")
    )
)]
pub async fn retreat(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::apply_event(&state, &owner_id, id, RoundEvent::Retreat).await?;
    Ok(Json(snapshot))
}

/// Jump to a hole.
#[utoipa::path(
    post,
    path = "/rounds/{id}/jump",
    tag = "round",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    request_body = JumpRequest,
    responses(
        (status = 200, description = "Round state", body = RoundSnapshot),
        (status = 409, description = "Round already completed")
    )
)]
pub async fn jump(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
    Json(payload): Json<JumpRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::apply_event(&state, &owner_id, id, payload.into()).await?;
    Ok(Json(snapshot))
}

/// Record or clear strokes for a player on a hole.
#[utoipa::path(
    put,
    path = "/rounds/{id}/scores",
    tag = "round",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    request_body = ScoreRequest,
    responses((status = 200, description = "Round state", body = RoundSnapshot))
)]
pub async fn set_score(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::apply_event(&state, &owner_id, id, payload.into()).await?;
    Ok(Json(snapshot))
}

/// Leaderboard of a live round.
#[utoipa::path(
    get,
    path = "/rounds/{id}/standings",
    tag = "round",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    responses((status = 200, description = "Standings", body = [StandingEntry]))
)]
pub async fn standings(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StandingEntry>>, AppError> {
    Ok(Json(round_service::standings(&state, &owner_id, id).await?))
}

/// Save the round now and close it.
#[utoipa::path(
    post,
    path = "/rounds/{id}/save",
    tag = "round",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    responses(
        (status = 200, description = "Final round state", body = RoundSnapshot),
        (status = 404, description = "Unknown round")
    )
)]
pub async fn save_and_exit(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(round_service::save_and_exit(&state, &owner_id, id).await?))
}
