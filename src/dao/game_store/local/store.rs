use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dao::{
    game_store::{GameStore, sort_newest_first},
    models::{GameEntity, GameId},
    storage::StorageResult,
};

use super::error::{LocalResult, LocalStoreError};

/// On-disk layout of the fallback file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalFile {
    games: Vec<GameEntity>,
}

/// Fallback game store living on the device.
///
/// Records are keyed by the UUID shared by the local and remote forms of an
/// identifier, so promoting a record after reconciliation replaces it in place.
/// Every mutation rewrites the whole file through a temporary sibling and a
/// rename. Without a path the store is memory-only.
#[derive(Clone)]
pub struct LocalGameStore {
    inner: Arc<LocalInner>,
}

struct LocalInner {
    path: Option<PathBuf>,
    records: RwLock<IndexMap<Uuid, GameEntity>>,
}

impl LocalGameStore {
    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::with_records(None, IndexMap::new())
    }

    /// Open the store file at `path`, starting empty when it does not exist yet.
    ///
    /// An unreadable file is logged and ignored so the service can still run.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match read_file(&path).await {
            Ok(records) => {
                info!(path = %path.display(), count = records.len(), "loaded local game store");
                records
            }
            Err(err) => {
                warn!(error = %err, "local game store unreadable; starting empty");
                IndexMap::new()
            }
        };

        Self::with_records(Some(path), records)
    }

    fn with_records(path: Option<PathBuf>, records: IndexMap<Uuid, GameEntity>) -> Self {
        Self {
            inner: Arc::new(LocalInner {
                path,
                records: RwLock::new(records),
            }),
        }
    }

    /// Records written while the remote store was unreachable.
    pub async fn pending(&self) -> Vec<GameEntity> {
        let guard = self.inner.records.read().await;
        guard
            .values()
            .filter(|game| game.pending_sync)
            .cloned()
            .collect()
    }

    /// Replace a replayed record with its synced form.
    ///
    /// Returns `false` and keeps the local copy when it was rewritten or removed
    /// after `replayed` was read, so the newer edit stays pending.
    pub async fn promote(&self, replayed: &GameEntity, synced: GameEntity) -> LocalResult<bool> {
        let mut guard = self.inner.records.write().await;
        match guard.get(&replayed.id.uuid()) {
            Some(current) if current.updated_at == replayed.updated_at => {}
            _ => return Ok(false),
        }
        guard.insert(synced.id.uuid(), synced);
        self.inner.flush(&guard).await?;
        Ok(true)
    }

    async fn upsert(&self, game: GameEntity) -> LocalResult<GameEntity> {
        let mut guard = self.inner.records.write().await;
        guard.insert(game.id.uuid(), game.clone());
        self.inner.flush(&guard).await?;
        Ok(game)
    }

    async fn remove(&self, id: GameId) -> LocalResult<bool> {
        let mut guard = self.inner.records.write().await;
        if guard.shift_remove(&id.uuid()).is_none() {
            return Ok(false);
        }
        self.inner.flush(&guard).await?;
        Ok(true)
    }
}

impl LocalInner {
    async fn flush(&self, records: &IndexMap<Uuid, GameEntity>) -> LocalResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let file = LocalFile {
            games: records.values().cloned().collect(),
        };
        let bytes =
            serde_json::to_vec_pretty(&file).map_err(|source| LocalStoreError::Encode { source })?;

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .await
            .map_err(|source| io_error(&tmp, source))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|source| io_error(path, source))?;

        debug!(path = %path.display(), count = records.len(), "local game store flushed");
        Ok(())
    }
}

async fn read_file(path: &Path) -> LocalResult<IndexMap<Uuid, GameEntity>> {
    let contents = match fs::read(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(IndexMap::new()),
        Err(source) => return Err(io_error(path, source)),
    };

    let file: LocalFile =
        serde_json::from_slice(&contents).map_err(|source| LocalStoreError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(file
        .games
        .into_iter()
        .map(|game| (game.id.uuid(), game))
        .collect())
}

fn io_error(path: &Path, source: std::io::Error) -> LocalStoreError {
    LocalStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl GameStore for LocalGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let game = GameEntity {
                updated_at: SystemTime::now(),
                ..game
            };
            store.upsert(game).await.map_err(Into::into)
        })
    }

    fn find_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.records.read().await;
            Ok(guard.get(&id.uuid()).cloned())
        })
    }

    fn list_games(&self, owner_id: String) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut games = {
                let guard = store.inner.records.read().await;
                guard
                    .values()
                    .filter(|game| game.owner_id == owner_id)
                    .cloned()
                    .collect::<Vec<_>>()
            };
            sort_newest_first(&mut games);
            Ok(games)
        })
    }

    fn delete_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.remove(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dao::models::{GameStatusEntity, PlayerEntity};

    fn game(owner: &str, created_at: SystemTime) -> GameEntity {
        GameEntity {
            id: GameId::Local(Uuid::new_v4()),
            owner_id: owner.into(),
            name: "Backyard".into(),
            players: vec![PlayerEntity {
                name: "Ada".into(),
                color: "red".into(),
                strokes: Default::default(),
            }],
            total_holes: 9,
            current_hole: 1,
            status: GameStatusEntity::InProgress,
            created_at,
            updated_at: created_at,
            pending_sync: true,
        }
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("mini-golf-local-{}", Uuid::new_v4()))
            .join("games.json")
    }

    #[tokio::test]
    async fn lists_only_the_owner_games_newest_first() {
        let store = LocalGameStore::in_memory();
        let now = SystemTime::now();
        let older = game("alice", now - Duration::from_secs(60));
        let newer = game("alice", now);
        store.save_game(older.clone()).await.unwrap();
        store.save_game(newer.clone()).await.unwrap();
        store.save_game(game("bob", now)).await.unwrap();

        let listed = store.list_games("alice".into()).await.unwrap();
        let ids = listed.iter().map(|g| g.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn promoted_records_replace_their_local_form() {
        let store = LocalGameStore::in_memory();
        let local = game("alice", SystemTime::now());
        store.save_game(local.clone()).await.unwrap();

        let promoted = GameEntity {
            id: local.id.into_remote(),
            pending_sync: false,
            ..local.clone()
        };
        store.save_game(promoted.clone()).await.unwrap();

        let listed = store.list_games("alice".into()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, promoted.id);
        assert!(store.pending().await.is_empty());
    }

    #[tokio::test]
    async fn promotion_skips_records_rewritten_meanwhile() {
        let store = LocalGameStore::in_memory();
        let replayed = store
            .save_game(game("alice", SystemTime::now()))
            .await
            .unwrap();
        let synced = GameEntity {
            id: replayed.id.into_remote(),
            pending_sync: false,
            ..replayed.clone()
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        store.save_game(replayed.clone()).await.unwrap();
        assert!(!store.promote(&replayed, synced.clone()).await.unwrap());
        assert_eq!(store.pending().await.len(), 1);

        let current = store.pending().await.remove(0);
        assert!(store.promote(&current, synced).await.unwrap());
        assert!(store.pending().await.is_empty());
    }

    #[tokio::test]
    async fn deleting_twice_is_not_an_error() {
        let store = LocalGameStore::in_memory();
        let record = game("alice", SystemTime::now());
        store.save_game(record.clone()).await.unwrap();

        assert!(store.delete_game(record.id).await.unwrap());
        assert!(!store.delete_game(record.id).await.unwrap());
    }

    #[tokio::test]
    async fn records_survive_a_reopen() {
        let path = temp_path();
        let record = game("alice", SystemTime::now());
        {
            let store = LocalGameStore::open(&path).await;
            store.save_game(record.clone()).await.unwrap();
        }

        let reopened = LocalGameStore::open(&path).await;
        let found = reopened.find_game(record.id).await.unwrap().unwrap();
        assert_eq!(found.name, record.name);
        assert_eq!(reopened.pending().await.len(), 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupt_files_start_empty() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();

        let store = LocalGameStore::open(&path).await;
        assert!(store.list_games("alice".into()).await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
