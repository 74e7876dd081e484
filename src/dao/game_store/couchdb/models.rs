use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::dao::{
    game_store::couchdb::error::CouchDaoError,
    models::{GameEntity, GameId, GameStatusEntity, PlayerEntity},
};

pub const GAME_PREFIX: &str = "game::";
/// Value of the `type` discriminator stored on every game document.
pub const GAME_DOC_TYPE: &str = "game";
/// Upper bound on documents returned by a single `_find` query.
pub const FIND_LIMIT: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct FindResponse {
    pub docs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub game: GameBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBody {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub owner_id: String,
    pub name: String,
    pub players: Vec<PlayerEntity>,
    pub total_holes: u32,
    pub current_hole: u32,
    pub status: GameStatusEntity,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl From<(GameEntity, Option<String>)> for CouchGameDocument {
    fn from((game, rev): (GameEntity, Option<String>)) -> Self {
        Self {
            id: game_doc_id(game.id.uuid()),
            rev,
            game: GameBody {
                doc_type: GAME_DOC_TYPE.to_string(),
                owner_id: game.owner_id,
                name: game.name,
                players: game.players,
                total_holes: game.total_holes,
                current_hole: game.current_hole,
                status: game.status,
                created_at: game.created_at,
                updated_at: game.updated_at,
            },
        }
    }
}

impl TryFrom<CouchGameDocument> for GameEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchGameDocument) -> Result<Self, Self::Error> {
        let body = doc.game;
        Ok(Self {
            id: GameId::Remote(extract_uuid(&doc.id)?),
            owner_id: body.owner_id,
            name: body.name,
            players: body.players,
            total_holes: body.total_holes,
            current_hole: body.current_hole,
            status: body.status,
            created_at: body.created_at,
            updated_at: body.updated_at,
            pending_sync: false,
        })
    }
}

/// Mango query selecting every game document of `owner_id`.
pub fn owner_selector(owner_id: &str) -> Value {
    json!({
        "selector": {
            "type": GAME_DOC_TYPE,
            "owner_id": owner_id,
        },
        "limit": FIND_LIMIT,
    })
}

pub fn game_doc_id(id: Uuid) -> String {
    format!("{}{}", GAME_PREFIX, id)
}

pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let id = doc_id
        .strip_prefix(GAME_PREFIX)
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "missing game prefix",
        })?;

    Uuid::parse_str(id).map_err(|_| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_string(),
        kind: "invalid UUID",
    })
}
