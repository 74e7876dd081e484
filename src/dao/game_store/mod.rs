#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod local;
#[cfg(test)]
pub(crate) mod testing;

use crate::dao::models::{GameEntity, GameId};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// CRUD contract over the `games` collection, shared by the remote and local stores.
pub trait GameStore: Send + Sync {
    /// Insert or replace a game, returning the canonical record with a refreshed `updated_at`.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>>;
    fn find_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Every game of `owner_id`, most recently created first.
    fn list_games(&self, owner_id: String) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Remove a game; returns whether something was deleted. Missing ids are not an error.
    fn delete_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Order games newest first, the way every `list_games` implementation returns them.
pub(crate) fn sort_newest_first(games: &mut [GameEntity]) {
    games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
