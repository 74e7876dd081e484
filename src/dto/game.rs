use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{format_system_time, validation::validate_color_token},
    state::game::{Game, GameStatus},
};

/// Payload used to set up a brand-new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_distinct_colors"))]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(length(min = 1), nested)]
    pub players: Vec<PlayerInput>,
    /// Number of holes; the configured default when omitted.
    #[serde(default)]
    pub total_holes: Option<u32>,
}

/// Incoming player definition.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayerInput {
    pub name: String,
    /// Color token. If omitted, the backend picks the first unused color from
    /// the configured palette.
    #[serde(default)]
    pub color: Option<String>,
}

impl Validate for PlayerInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            let mut err = ValidationError::new("player_name_empty");
            err.message = Some("Player name must not be blank".into());
            errors.add("name", err);
        }

        if let Some(ref color) = self.color {
            if let Err(e) = validate_color_token(color) {
                errors.add("color", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_distinct_colors(request: &CreateGameRequest) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    let duplicate = request
        .players
        .iter()
        .filter_map(|player| player.color.as_deref())
        .any(|color| !seen.insert(color));

    if duplicate {
        let mut err = ValidationError::new("duplicate_color");
        err.message = Some("Each player needs a distinct color".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Lifecycle status exposed to clients.
pub enum GameStatusDto {
    InProgress,
    Completed,
}

impl From<GameStatus> for GameStatusDto {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::InProgress => GameStatusDto::InProgress,
            GameStatus::Completed => GameStatusDto::Completed,
        }
    }
}

/// Dashboard entry for one saved game.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameListItem {
    pub id: String,
    pub name: String,
    pub status: GameStatusDto,
    pub current_hole: u32,
    pub total_holes: u32,
    pub players: Vec<PlayerTotal>,
    /// Lowest non-zero player total.
    pub best_score: Option<u32>,
    /// Saved on this device only, not yet synced.
    pub local_only: bool,
    /// Round currently open on this game, if any.
    pub live_round_id: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Player name and running total shown on the dashboard.
pub struct PlayerTotal {
    pub name: String,
    pub color: String,
    pub total: u32,
}

impl GameListItem {
    /// Summarise a game that has an id.
    pub fn from_game(game: &Game, live_round_id: Option<Uuid>) -> Option<Self> {
        let id = game.id?;
        Some(Self {
            id: id.to_string(),
            name: game.name.clone(),
            status: game.status.into(),
            current_hole: game.current_hole,
            total_holes: game.total_holes,
            players: game
                .players
                .iter()
                .enumerate()
                .map(|(index, player)| PlayerTotal {
                    name: player.name.clone(),
                    color: player.color.to_string(),
                    total: game.ledger.total_for(index),
                })
                .collect(),
            best_score: game.ledger.game_total(),
            local_only: id.is_local(),
            live_round_id,
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
        })
    }
}

/// Identity details shown in the header.
#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerProfile {
    pub owner_id: String,
    /// Up to two uppercase letters derived from the owner id.
    pub initials: String,
}
