use crate::{
    dao::models::GameId,
    dto::{
        game::{CreateGameRequest, GameListItem, OwnerProfile, PlayerInput},
        round::RoundSnapshot,
    },
    error::ServiceError,
    services::{round_service, sse_events},
    state::{
        SharedState,
        game::{Game, Player, PlayerColor},
    },
};

const FALLBACK_INITIALS: &str = "U";

/// Set up a new game and open it as a live round.
///
/// The game is saved once right away so it shows up on the dashboard even if
/// nobody records a stroke.
pub async fn create_game(
    state: &SharedState,
    owner_id: &str,
    request: CreateGameRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let game = build_game(state, owner_id, request)?;
    Ok(round_service::start_round(state, game, true).await)
}

/// Dashboard listing for `owner_id`, newest first.
///
/// Games with an open round show their live state rather than the last save.
pub async fn list_games(state: &SharedState, owner_id: &str) -> Vec<GameListItem> {
    let live = round_service::live_rounds_of(state, owner_id).await;

    state
        .gateway()
        .load(owner_id)
        .await
        .into_iter()
        .filter_map(|game| {
            let uuid = game.id.map(|id| id.uuid());
            match live.iter().find(|(_, live_game)| live_game.id.map(|id| id.uuid()) == uuid) {
                Some((round_id, live_game)) => GameListItem::from_game(live_game, Some(*round_id)),
                None => GameListItem::from_game(&game, None),
            }
        })
        .collect()
}

/// Resume a saved game, reusing its live round when one is already open.
pub async fn open_game(
    state: &SharedState,
    owner_id: &str,
    game_id: GameId,
) -> Result<RoundSnapshot, ServiceError> {
    if let Some(round) = round_service::live_round_for_game(state, owner_id, game_id).await {
        return Ok(round_service::build_snapshot(state, &round).await);
    }

    let game = find_owned_game(state, owner_id, game_id).await?;
    Ok(round_service::start_round(state, game, false).await)
}

/// Start a new round with the players and hole count of an existing game.
pub async fn duplicate_game(
    state: &SharedState,
    owner_id: &str,
    game_id: GameId,
) -> Result<RoundSnapshot, ServiceError> {
    let source = match round_service::live_round_for_game(state, owner_id, game_id).await {
        Some(round) => round.read(|controller| controller.game().clone()).await,
        None => find_owned_game(state, owner_id, game_id).await?,
    };

    Ok(round_service::start_round(state, source.duplicate(), true).await)
}

/// Delete a saved game, discarding any open round on it without saving.
pub async fn delete_game(
    state: &SharedState,
    owner_id: &str,
    game_id: GameId,
) -> Result<(), ServiceError> {
    if let Some(game) = state.gateway().find(game_id).await {
        if game.owner_id != owner_id {
            return Err(not_found(game_id));
        }
    }

    while let Some(round) = round_service::live_round_for_game(state, owner_id, game_id).await {
        state.rounds().remove(&round.id());
        round.discard();
        sse_events::broadcast_round_closed(state.events(), owner_id, round.id(), Some(game_id));
    }

    state.gateway().delete(game_id).await;
    Ok(())
}

/// Header identity details for `owner_id`.
pub fn owner_profile(owner_id: &str) -> OwnerProfile {
    OwnerProfile {
        owner_id: owner_id.to_string(),
        initials: initials(owner_id),
    }
}

/// First two ASCII letters of `source`, uppercased; `"U"` when there are none.
fn initials(source: &str) -> String {
    let letters = source
        .chars()
        .filter(char::is_ascii_alphabetic)
        .take(2)
        .map(|c| c.to_ascii_uppercase())
        .collect::<String>();

    if letters.is_empty() {
        FALLBACK_INITIALS.to_string()
    } else {
        letters
    }
}

async fn find_owned_game(
    state: &SharedState,
    owner_id: &str,
    game_id: GameId,
) -> Result<Game, ServiceError> {
    match state.gateway().find(game_id).await {
        Some(game) if game.owner_id == owner_id => Ok(game),
        _ => Err(not_found(game_id)),
    }
}

fn not_found(game_id: GameId) -> ServiceError {
    ServiceError::NotFound(format!("game `{game_id}` not found"))
}

fn build_game(
    state: &SharedState,
    owner_id: &str,
    request: CreateGameRequest,
) -> Result<Game, ServiceError> {
    let config = state.config();
    let CreateGameRequest {
        name,
        players,
        total_holes,
    } = request;

    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "game name must not be empty".into(),
        ));
    }

    if players.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a game requires at least one player".into(),
        ));
    }

    if players.len() > config.max_players() {
        return Err(ServiceError::InvalidInput(format!(
            "a game allows at most {} players",
            config.max_players()
        )));
    }

    let total_holes = total_holes.unwrap_or(config.default_holes());
    if !(1..=config.max_holes()).contains(&total_holes) {
        return Err(ServiceError::InvalidInput(format!(
            "hole count must be between 1 and {}",
            config.max_holes()
        )));
    }

    let players = build_players(state, players)?;
    Ok(Game::new(
        owner_id.to_string(),
        name.to_string(),
        players,
        total_holes,
        config.score_range(),
    ))
}

fn build_players(state: &SharedState, players: Vec<PlayerInput>) -> Result<Vec<Player>, ServiceError> {
    let mut used = Vec::with_capacity(players.len());
    for color in players.iter().filter_map(|player| player.color.as_deref()) {
        let color = PlayerColor::new(color);
        if used.contains(&color) {
            return Err(ServiceError::InvalidInput(format!(
                "color `{color}` is used by more than one player"
            )));
        }
        used.push(color);
    }

    players
        .into_iter()
        .map(|player| {
            let name = player.name.trim();
            if name.is_empty() {
                return Err(ServiceError::InvalidInput(
                    "player name must not be empty".into(),
                ));
            }

            let color = match player.color {
                Some(color) => PlayerColor::new(color),
                None => {
                    let color = state.config().first_unused_color(&used).ok_or_else(|| {
                        ServiceError::InvalidInput("no unused color left for a player".into())
                    })?;
                    used.push(color.clone());
                    color
                }
            };

            Ok(Player {
                name: name.to_string(),
                color,
            })
        })
        .collect()
}
