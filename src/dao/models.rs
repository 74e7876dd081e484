use std::{collections::BTreeMap, fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

/// Prefix marking identifiers minted by the local fallback store.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Identifier of a persisted game.
///
/// Both variants wrap a UUID. Remote identifiers print as the bare UUID while
/// local ones carry [`LOCAL_ID_PREFIX`], so a record saved while offline is
/// recognisable everywhere it travels (URLs, local file, SSE payloads).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum GameId {
    /// Record known to the remote store.
    Remote(Uuid),
    /// Record that only exists in the local fallback store.
    Local(Uuid),
}

impl GameId {
    /// Underlying UUID, shared by the local and remote forms of the same record.
    pub fn uuid(&self) -> Uuid {
        match self {
            GameId::Remote(uuid) | GameId::Local(uuid) => *uuid,
        }
    }

    /// Whether the identifier was minted by the local store.
    pub fn is_local(&self) -> bool {
        matches!(self, GameId::Local(_))
    }

    /// Remote form of the identifier, keeping the UUID so replays upsert the same document.
    pub fn into_remote(self) -> Self {
        GameId::Remote(self.uuid())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameId::Remote(uuid) => write!(f, "{uuid}"),
            GameId::Local(uuid) => write!(f, "{LOCAL_ID_PREFIX}{uuid}"),
        }
    }
}

/// Error returned when a string is not a valid [`GameId`].
#[derive(Debug, Error)]
#[error("invalid game id `{0}`")]
pub struct InvalidGameId(String);

impl FromStr for GameId {
    type Err = InvalidGameId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (local, raw) = match value.strip_prefix(LOCAL_ID_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, value),
        };

        let uuid = Uuid::parse_str(raw).map_err(|_| InvalidGameId(value.to_string()))?;
        Ok(if local {
            GameId::Local(uuid)
        } else {
            GameId::Remote(uuid)
        })
    }
}

/// Lifecycle status stored alongside each game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusEntity {
    /// Holes are still being played.
    InProgress,
    /// The last hole has been passed.
    Completed,
}

/// Player stored with its recorded strokes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Display name.
    pub name: String,
    /// Color token, unique within the game.
    pub color: String,
    /// Strokes keyed by hole number (1-based). Unscored holes are absent.
    #[serde(default)]
    pub strokes: BTreeMap<u32, u8>,
}

/// Aggregate game entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: GameId,
    /// Opaque identifier of the owner supplied by the identity provider.
    pub owner_id: String,
    /// Display name of the round.
    pub name: String,
    /// Players in registration order; their index is the ledger key.
    pub players: Vec<PlayerEntity>,
    /// Number of holes in the round.
    pub total_holes: u32,
    /// Hole currently being played (1-based).
    pub current_hole: u32,
    /// Whether the round is still running.
    pub status: GameStatusEntity,
    /// Creation timestamp, used to order dashboards.
    pub created_at: SystemTime,
    /// Last time the game entity was written.
    pub updated_at: SystemTime,
    /// Set on local records that still have to be replayed against the remote store.
    #[serde(default)]
    pub pending_sync: bool,
}
