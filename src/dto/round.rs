use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::{format_system_time, game::GameStatusDto, validation::parse_strokes},
    state::round::{RoundController, RoundEvent},
};

/// Full view of a live round, returned by every round command and pushed over SSE.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundSnapshot {
    pub round_id: Uuid,
    /// Persisted identifier, `None` until the first save lands.
    pub game_id: Option<String>,
    /// Whether the last save only reached the local fallback store.
    pub local_only: bool,
    pub name: String,
    pub status: GameStatusDto,
    pub current_hole: u32,
    pub total_holes: u32,
    /// Whether every player has strokes on the current hole.
    pub current_hole_complete: bool,
    pub players: Vec<PlayerCard>,
    pub standings: Vec<StandingEntry>,
    /// Lowest non-zero total, `None` while nobody has scored.
    pub best_score: Option<u32>,
    pub min_strokes: u8,
    pub max_strokes: u8,
    pub updated_at: String,
}

/// One scorecard column.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerCard {
    pub index: usize,
    pub name: String,
    pub color: String,
    /// Display value of the color token, when the palette knows it.
    pub color_value: Option<String>,
    pub total: u32,
    /// Strokes by hole number.
    pub strokes: BTreeMap<u32, u8>,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StandingEntry {
    /// 1-based position; players with equal totals keep registration order.
    pub position: usize,
    pub player_index: usize,
    pub name: String,
    pub total: u32,
    pub has_scores: bool,
}

impl RoundSnapshot {
    /// Project the controller's state for clients.
    pub fn build(round_id: Uuid, round: &RoundController, config: &AppConfig) -> Self {
        let game = round.game();
        let range = game.ledger.range();

        let players = game
            .players
            .iter()
            .enumerate()
            .map(|(index, player)| PlayerCard {
                index,
                name: player.name.clone(),
                color: player.color.to_string(),
                color_value: config.color_value(player.color.as_str()).map(str::to_string),
                total: game.ledger.total_for(index),
                strokes: game.ledger.row(index).cloned().unwrap_or_default(),
            })
            .collect();

        let standings = round
            .standings()
            .into_iter()
            .enumerate()
            .map(|(position, standing)| StandingEntry {
                position: position + 1,
                player_index: standing.player_index,
                name: game
                    .players
                    .get(standing.player_index)
                    .map(|player| player.name.clone())
                    .unwrap_or_default(),
                total: standing.total,
                has_scores: standing.has_scores,
            })
            .collect();

        Self {
            round_id,
            game_id: game.id.map(|id| id.to_string()),
            local_only: game.is_local_only(),
            name: game.name.clone(),
            status: round.status().into(),
            current_hole: round.current_hole(),
            total_holes: round.total_holes(),
            current_hole_complete: game.ledger.is_hole_complete(round.current_hole()),
            players,
            standings,
            best_score: game.ledger.game_total(),
            min_strokes: range.min(),
            max_strokes: range.max(),
            updated_at: format_system_time(game.updated_at),
        }
    }
}

/// Jump straight to a hole; holes outside the round are ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JumpRequest {
    pub hole: i64,
}

impl From<JumpRequest> for RoundEvent {
    fn from(value: JumpRequest) -> Self {
        // Negative or oversized holes map to 0, which the controller ignores.
        RoundEvent::JumpTo(u32::try_from(value.hole).unwrap_or(0))
    }
}

/// Record strokes for one player on one hole.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreRequest {
    pub player_index: usize,
    pub hole: u32,
    /// Raw input: integers and numeric strings are accepted, anything else clears the hole.
    #[serde(default)]
    pub value: Value,
}

impl From<ScoreRequest> for RoundEvent {
    fn from(value: ScoreRequest) -> Self {
        RoundEvent::SetScore {
            player_index: value.player_index,
            hole: value.hole,
            value: parse_strokes(&value.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::{
        game::{Game, Player, PlayerColor},
        ledger::ScoreRange,
    };

    fn controller() -> RoundController {
        let players = ["Ada", "Grace", "Linus"]
            .into_iter()
            .zip(["red", "blue", "mauve"])
            .map(|(name, color)| Player {
                name: name.into(),
                color: PlayerColor::new(color),
            })
            .collect();
        RoundController::new(Game::new(
            "owner".into(),
            "Boardwalk".into(),
            players,
            9,
            ScoreRange::default(),
        ))
    }

    #[test]
    fn snapshot_ranks_scored_players_first() {
        let mut round = controller();
        round.set_score(2, 1, Some(2));
        round.set_score(0, 1, Some(4));

        let snapshot = RoundSnapshot::build(Uuid::nil(), &round, &AppConfig::default());
        let order: Vec<_> = snapshot.standings.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, ["Linus", "Ada", "Grace"]);
        assert_eq!(snapshot.standings[2].position, 3);
        assert!(!snapshot.standings[2].has_scores);
        assert_eq!(snapshot.best_score, Some(2));
        assert!(!snapshot.current_hole_complete);
        assert_eq!(snapshot.game_id, None);
    }

    #[test]
    fn unknown_colors_have_no_display_value() {
        let round = controller();
        let snapshot = RoundSnapshot::build(Uuid::nil(), &round, &AppConfig::default());
        assert_eq!(snapshot.players[0].color_value.as_deref(), Some("#e53935"));
        assert_eq!(snapshot.players[2].color_value, None);
    }

    #[test]
    fn score_requests_parse_forgivingly() {
        let request: ScoreRequest =
            serde_json::from_value(json!({ "player_index": 1, "hole": 3, "value": "4" })).unwrap();
        assert_eq!(
            RoundEvent::from(request),
            RoundEvent::SetScore {
                player_index: 1,
                hole: 3,
                value: Some(4)
            }
        );

        let cleared: ScoreRequest =
            serde_json::from_value(json!({ "player_index": 1, "hole": 3 })).unwrap();
        assert_eq!(
            RoundEvent::from(cleared),
            RoundEvent::SetScore {
                player_index: 1,
                hole: 3,
                value: None
            }
        );
    }

    #[test]
    fn negative_jumps_are_ignored_by_the_controller() {
        let mut round = controller();
        let event = RoundEvent::from(JumpRequest { hole: -4 });
        assert!(!round.apply(event).unwrap().is_change());
    }
}
