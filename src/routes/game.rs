use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dao::models::GameId,
    dto::{
        game::{CreateGameRequest, GameListItem, OwnerProfile},
        round::RoundSnapshot,
    },
    error::AppError,
    routes::identity::OwnerId,
    services::game_service,
    state::SharedState,
};

/// Routes handling game setup, the dashboard and the owner profile.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/me", get(me))
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", delete(delete_game))
        .route("/games/{id}/open", post(open_game))
        .route("/games/{id}/duplicate", post(duplicate_game))
}

/// Identity details for the header.
#[utoipa::path(
    get,
    path = "/me",
    tag = "game",
    params(("x-owner-id" = String, Header, description = "Owner identity")),
    responses((status = 200, description = "Owner profile", body = OwnerProfile))
)]
pub async fn me(OwnerId(owner_id): OwnerId) -> Json<OwnerProfile> {
    Json(game_service::owner_profile(&owner_id))
}

/// List the owner's saved games, newest first.
#[utoipa::path(
    get,
    path = "/games",
    tag = "game",
    params(("x-owner-id" = String, Header, description = "Owner identity")),
    responses((status = 200, description = "Saved games", body = [GameListItem]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
) -> Json<Vec<GameListItem>> {
    Json(game_service::list_games(&state, &owner_id).await)
}

/// Set up a new game and open a live round on it.
#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    params(("x-owner-id" = String, Header, description = "Owner identity")),
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Round opened on the new game", body = RoundSnapshot),
        (status = 400, description = "Invalid setup")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = game_service::create_game(&state, &owner_id, payload).await?;
    Ok(Json(snapshot))
}

/// Resume a saved game.
#[utoipa::path(
    post,
    path = "/games/{id}/open",
    tag = "game",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = String, Path, description = "Game identifier, remote or `local-` prefixed")
    ),
    responses(
        (status = 200, description = "Round opened", body = RoundSnapshot),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn open_game(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let id = parse_game_id(&id)?;
    Ok(Json(game_service::open_game(&state, &owner_id, id).await?))
}

/// Start a fresh round with the players and holes of a saved game.
#[utoipa::path(
    post,
    path = "/games/{id}/duplicate",
    tag = "game",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = String, Path, description = "Game identifier to copy")
    ),
    responses(
        (status = 200, description = "Round opened on the copy", body = RoundSnapshot),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn duplicate_game(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let id = parse_game_id(&id)?;
    Ok(Json(
        game_service::duplicate_game(&state, &owner_id, id).await?,
    ))
}

/// Delete a saved game.
#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "game",
    params(
        ("x-owner-id" = String, Header, description = "Owner identity"),
        ("id" = String, Path, description = "Game identifier to delete")
    ),
    responses((status = 204, description = "Game deleted"))
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_game_id(&id)?;
    game_service::delete_game(&state, &owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_game_id(raw: &str) -> Result<GameId, AppError> {
    raw.parse()
        .map_err(|err: crate::dao::models::InvalidGameId| AppError::BadRequest(err.to_string()))
}
