use std::{fmt, time::SystemTime};

use crate::{
    dao::models::{GameEntity, GameId, GameStatusEntity, PlayerEntity},
    state::ledger::{ScoreLedger, ScoreRange},
};

/// Color token identifying a player on the scorecard (e.g. `"red"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerColor(String);

impl PlayerColor {
    /// Wrap a palette token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token as stored and sent to clients.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Player taking part in a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name, never empty.
    pub name: String,
    /// Color token, unique within the game.
    pub color: PlayerColor,
}

/// Whether holes are still being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Holes are still being played.
    InProgress,
    /// The last hole has been passed; only score corrections remain.
    Completed,
}

/// Live state of one round: players, ledger and hole pointer.
#[derive(Debug, Clone)]
pub struct Game {
    /// `None` until the game has been persisted once.
    pub id: Option<GameId>,
    /// Owner namespace supplied by the identity provider.
    pub owner_id: String,
    /// Display name of the round.
    pub name: String,
    /// Players in registration order; the index is their ledger key.
    pub players: Vec<Player>,
    /// Strokes per player and hole.
    pub ledger: ScoreLedger,
    /// Number of holes, at least one.
    pub total_holes: u32,
    /// Always within `1..=total_holes`.
    pub current_hole: u32,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Set once, when the game is created.
    pub created_at: SystemTime,
    /// Refreshed by every persisted write.
    pub updated_at: SystemTime,
}

impl Game {
    /// Fresh, unsaved game starting on hole 1.
    pub fn new(
        owner_id: String,
        name: String,
        players: Vec<Player>,
        total_holes: u32,
        range: ScoreRange,
    ) -> Self {
        let now = SystemTime::now();
        let ledger = ScoreLedger::new(players.len(), range);
        Self {
            id: None,
            owner_id,
            name,
            players,
            ledger,
            total_holes: total_holes.max(1),
            current_hole: 1,
            status: GameStatus::InProgress,
            created_at: now,
            updated_at: now,
        }
    }

    /// New unsaved game with the same players and hole count and an empty ledger.
    pub fn duplicate(&self) -> Self {
        Self::new(
            self.owner_id.clone(),
            self.name.clone(),
            self.players.clone(),
            self.total_holes,
            self.ledger.range(),
        )
    }

    /// Whether the last known copy only lives in the local fallback store.
    pub fn is_local_only(&self) -> bool {
        self.id.is_some_and(|id| id.is_local())
    }

    /// Persistable form of the game under `id`.
    pub fn to_entity(&self, id: GameId, pending_sync: bool) -> GameEntity {
        GameEntity {
            id,
            owner_id: self.owner_id.clone(),
            name: self.name.clone(),
            players: self
                .players
                .iter()
                .enumerate()
                .map(|(index, player)| PlayerEntity {
                    name: player.name.clone(),
                    color: player.color.as_str().to_string(),
                    strokes: self.ledger.row(index).cloned().unwrap_or_default(),
                })
                .collect(),
            total_holes: self.total_holes,
            current_hole: self.current_hole,
            status: self.status.into(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            pending_sync,
        }
    }

    /// Rebuild a game from its persisted form, repairing an out-of-range hole pointer.
    pub fn from_entity(entity: GameEntity, range: ScoreRange) -> Self {
        let total_holes = entity.total_holes.max(1);
        let (players, rows): (Vec<_>, Vec<_>) = entity
            .players
            .into_iter()
            .map(|player| {
                (
                    Player {
                        name: player.name,
                        color: PlayerColor::new(player.color),
                    },
                    player.strokes,
                )
            })
            .unzip();

        Self {
            id: Some(entity.id),
            owner_id: entity.owner_id,
            name: entity.name,
            players,
            ledger: ScoreLedger::from_rows(rows, range),
            total_holes,
            current_hole: entity.current_hole.clamp(1, total_holes),
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<GameStatus> for GameStatusEntity {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::InProgress => GameStatusEntity::InProgress,
            GameStatus::Completed => GameStatusEntity::Completed,
        }
    }
}

impl From<GameStatusEntity> for GameStatus {
    fn from(value: GameStatusEntity) -> Self {
        match value {
            GameStatusEntity::InProgress => GameStatus::InProgress,
            GameStatusEntity::Completed => GameStatus::Completed,
        }
    }
}
