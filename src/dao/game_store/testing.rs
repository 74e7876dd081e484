//! In-memory remote store that can be switched off, for gateway and supervisor tests.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::SystemTime,
};

use futures::future::BoxFuture;

use crate::dao::{
    game_store::{GameStore, sort_newest_first},
    models::{GameEntity, GameId},
    storage::{StorageError, StorageResult},
};

#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: Arc<FlakyInner>,
}

#[derive(Default)]
struct FlakyInner {
    games: Mutex<HashMap<uuid::Uuid, GameEntity>>,
    offline: AtomicBool,
    saves: AtomicUsize,
}

impl FlakyStore {
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Successful saves so far.
    pub fn saves(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<GameEntity> {
        self.inner.games.lock().unwrap().values().cloned().collect()
    }

    pub fn as_store(&self) -> Arc<dyn GameStore> {
        Arc::new(self.clone())
    }

    fn check(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "remote unreachable".into(),
                std::io::Error::other("switched off"),
            ))
        } else {
            Ok(())
        }
    }
}

impl GameStore for FlakyStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            let saved = GameEntity {
                id: game.id.into_remote(),
                updated_at: SystemTime::now(),
                pending_sync: false,
                ..game
            };
            store
                .inner
                .games
                .lock()
                .unwrap()
                .insert(saved.id.uuid(), saved.clone());
            store.inner.saves.fetch_add(1, Ordering::SeqCst);
            Ok(saved)
        })
    }

    fn find_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            Ok(store.inner.games.lock().unwrap().get(&id.uuid()).cloned())
        })
    }

    fn list_games(&self, owner_id: String) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            let mut games = store
                .inner
                .games
                .lock()
                .unwrap()
                .values()
                .filter(|game| game.owner_id == owner_id)
                .cloned()
                .collect::<Vec<_>>();
            sort_newest_first(&mut games);
            Ok(games)
        })
    }

    fn delete_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            Ok(store.inner.games.lock().unwrap().remove(&id.uuid()).is_some())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check() })
    }
}
