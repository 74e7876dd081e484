use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::{GameStore, local::LocalGameStore, sort_newest_first},
        models::{GameEntity, GameId},
    },
    dto::sse::SyncReport,
    services::sse_events,
    state::{SseHub, game::Game, ledger::ScoreRange},
};

/// Single entry point for saving and loading games.
///
/// Writes go to the remote store while it is reachable and fall back to the
/// local store otherwise. Callers never see a storage error: every save
/// resolves to a record, and failures surface as SSE notices instead.
/// Records saved locally are flagged `pending_sync` until [`reconcile`]
/// replays them under the same UUID.
///
/// [`reconcile`]: PersistenceGateway::reconcile
#[derive(Clone)]
pub struct PersistenceGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    remote: RwLock<Option<Arc<dyn GameStore>>>,
    local: LocalGameStore,
    online: watch::Sender<bool>,
    sync_gate: Mutex<()>,
    range: ScoreRange,
    events: SseHub,
}

impl PersistenceGateway {
    /// Gateway that starts offline until a remote store is installed and reported healthy.
    pub fn new(local: LocalGameStore, range: ScoreRange, events: SseHub) -> Self {
        let (online, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(GatewayInner {
                remote: RwLock::new(None),
                local,
                online,
                sync_gate: Mutex::new(()),
                range,
                events,
            }),
        }
    }

    /// Install a freshly connected remote store. Connectivity is left to [`set_online`].
    ///
    /// [`set_online`]: PersistenceGateway::set_online
    pub async fn install_remote(&self, store: Arc<dyn GameStore>) {
        let mut guard = self.inner.remote.write().await;
        *guard = Some(store);
    }

    /// Drop the remote store and go offline.
    pub async fn clear_remote(&self) {
        {
            let mut guard = self.inner.remote.write().await;
            guard.take();
        }
        self.set_online(false);
    }

    /// Current connectivity flag.
    pub fn is_online(&self) -> bool {
        *self.inner.online.borrow()
    }

    /// Flip the connectivity flag, broadcasting a notice when it changes.
    ///
    /// Returns whether the flag changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.inner.online.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            if online {
                info!("remote store reachable; saving remotely");
            } else {
                warn!("remote store unreachable; saving locally");
            }
            sse_events::broadcast_connectivity(&self.inner.events, online);
        }
        changed
    }

    async fn active_remote(&self) -> Option<Arc<dyn GameStore>> {
        if !self.is_online() {
            return None;
        }
        let guard = self.inner.remote.read().await;
        guard.as_ref().cloned()
    }

    /// Persist `game`, returning the canonical saved copy.
    ///
    /// An unsaved game gets a remote id when the remote store takes it and a
    /// `local-` id otherwise. If even the local write fails, the game comes back
    /// with the id it would have been stored under so later saves reuse it.
    pub async fn save(&self, game: &Game) -> Game {
        if let Some(remote) = self.active_remote().await {
            let id = game
                .id
                .map(GameId::into_remote)
                .unwrap_or_else(|| GameId::Remote(Uuid::new_v4()));

            match remote.save_game(game.to_entity(id, false)).await {
                Ok(saved) => {
                    debug!(game_id = %saved.id, "game saved remotely");
                    self.mirror(saved.clone()).await;
                    return Game::from_entity(saved, self.inner.range);
                }
                Err(err) => {
                    warn!(game_id = %id, error = %err, "remote save failed; falling back to local store");
                    self.set_online(false);
                }
            }
        }

        self.save_locally(game).await
    }

    async fn save_locally(&self, game: &Game) -> Game {
        let id = game.id.unwrap_or_else(|| GameId::Local(Uuid::new_v4()));
        let entity = game.to_entity(id, true);

        match self.inner.local.save_game(entity.clone()).await {
            Ok(saved) => {
                info!(game_id = %id, "game saved locally");
                sse_events::broadcast_saved_locally(&self.inner.events, &game.owner_id, id);
                Game::from_entity(saved, self.inner.range)
            }
            Err(err) => {
                error!(game_id = %id, error = %err, "local save failed; change only kept in memory");
                sse_events::broadcast_local_write_failed(&self.inner.events, &game.owner_id, id);
                Game::from_entity(entity, self.inner.range)
            }
        }
    }

    /// Keep a synced copy on the device so games stay listable while offline.
    async fn mirror(&self, saved: GameEntity) {
        if let Err(err) = self.inner.local.save_game(saved).await {
            warn!(error = %err, "failed to mirror remote save into the local store");
        }
    }

    /// Every game of `owner_id`, newest first.
    ///
    /// Unsynced local records are listed next to (or in place of) their remote copy.
    pub async fn load(&self, owner_id: &str) -> Vec<Game> {
        if let Some(remote) = self.active_remote().await {
            match remote.list_games(owner_id.to_string()).await {
                Ok(mut games) => {
                    for pending in self.inner.local.pending().await {
                        if pending.owner_id != owner_id {
                            continue;
                        }
                        match games.iter_mut().find(|game| game.id.uuid() == pending.id.uuid()) {
                            Some(slot) => *slot = pending,
                            None => games.push(pending),
                        }
                    }
                    sort_newest_first(&mut games);
                    return self.into_games(games);
                }
                Err(err) => {
                    warn!(error = %err, "remote listing failed; reading local store");
                    self.set_online(false);
                }
            }
        }

        match self.inner.local.list_games(owner_id.to_string()).await {
            Ok(games) => self.into_games(games),
            Err(err) => {
                error!(error = %err, "local listing failed");
                Vec::new()
            }
        }
    }

    /// Look a single game up, preferring an unsynced local copy.
    pub async fn find(&self, id: GameId) -> Option<Game> {
        let local = match self.inner.local.find_game(id).await {
            Ok(found) => found,
            Err(err) => {
                warn!(game_id = %id, error = %err, "local lookup failed");
                None
            }
        };

        if let Some(entity) = local.as_ref().filter(|entity| entity.pending_sync) {
            return Some(Game::from_entity(entity.clone(), self.inner.range));
        }

        if !id.is_local() {
            if let Some(remote) = self.active_remote().await {
                match remote.find_game(id.into_remote()).await {
                    Ok(found) => return found.map(|entity| Game::from_entity(entity, self.inner.range)),
                    Err(err) => {
                        warn!(game_id = %id, error = %err, "remote lookup failed; reading local store");
                        self.set_online(false);
                    }
                }
            }
        }

        local.map(|entity| Game::from_entity(entity, self.inner.range))
    }

    /// Delete a game wherever it lives. Unknown ids are not an error.
    ///
    /// A `local-` id still reaches the remote store: once reconciled, the
    /// record lives there under the same UUID.
    pub async fn delete(&self, id: GameId) {
        if let Some(remote) = self.active_remote().await {
            if let Err(err) = remote.delete_game(id.into_remote()).await {
                warn!(game_id = %id, error = %err, "remote delete failed; deleting locally only");
                self.set_online(false);
            }
        }

        if let Err(err) = self.inner.local.delete_game(id).await {
            warn!(game_id = %id, error = %err, "local delete failed");
        }
    }

    /// Replay every unsynced local record to the remote store.
    ///
    /// Records keep their UUID, so replaying twice upserts the same remote
    /// document. Failures are counted and left pending for the next pass.
    pub async fn reconcile(&self) -> SyncReport {
        let _gate = self.inner.sync_gate.lock().await;
        let mut report = SyncReport::default();

        let Some(remote) = self.active_remote().await else {
            return report;
        };

        for record in self.inner.local.pending().await {
            let replay = GameEntity {
                id: record.id.into_remote(),
                pending_sync: false,
                ..record.clone()
            };

            match remote.save_game(replay).await {
                Ok(synced) => {
                    report.synced += 1;
                    match self.inner.local.promote(&record, synced).await {
                        Ok(true) => {}
                        Ok(false) => {
                            debug!(game_id = %record.id, "record changed during sync; left pending")
                        }
                        Err(err) => {
                            warn!(game_id = %record.id, error = %err, "failed to mark record synced")
                        }
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(game_id = %record.id, error = %err, "failed to sync local record");
                    // Next healthy poll flips back online and replays again.
                    self.set_online(false);
                }
            }
        }

        if !report.is_empty() {
            info!(synced = report.synced, failed = report.failed, "local records reconciled");
            sse_events::broadcast_sync_completed(&self.inner.events, report);
        }
        report
    }

    /// Number of local records still waiting for [`reconcile`](PersistenceGateway::reconcile).
    pub async fn pending_count(&self) -> usize {
        self.inner.local.pending().await.len()
    }

    fn into_games(&self, entities: Vec<GameEntity>) -> Vec<Game> {
        entities
            .into_iter()
            .map(|entity| Game::from_entity(entity, self.inner.range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::game_store::testing::FlakyStore,
        state::game::{Player, PlayerColor},
    };

    fn game(owner: &str) -> Game {
        Game::new(
            owner.into(),
            "Lighthouse".into(),
            vec![Player {
                name: "Ada".into(),
                color: PlayerColor::new("red"),
            }],
            9,
            ScoreRange::default(),
        )
    }

    async fn gateway(remote: Option<&FlakyStore>) -> (PersistenceGateway, LocalGameStore, SseHub) {
        let local = LocalGameStore::in_memory();
        let events = SseHub::default();
        let gateway = PersistenceGateway::new(local.clone(), ScoreRange::default(), events.clone());
        if let Some(remote) = remote {
            gateway.install_remote(remote.as_store()).await;
            gateway.set_online(true);
        }
        (gateway, local, events)
    }

    #[tokio::test]
    async fn online_saves_get_remote_ids() {
        let remote = FlakyStore::default();
        let (gateway, local, _) = gateway(Some(&remote)).await;

        let saved = gateway.save(&game("alice")).await;
        let id = saved.id.unwrap();
        assert!(!id.is_local());
        assert_eq!(remote.records().len(), 1);
        assert!(local.pending().await.is_empty());

        let again = gateway.save(&saved).await;
        assert_eq!(again.id, Some(id));
        assert_eq!(remote.records().len(), 1);
    }

    #[tokio::test]
    async fn remote_failure_falls_back_and_goes_offline() {
        let remote = FlakyStore::default();
        let (gateway, local, events) = gateway(Some(&remote)).await;
        let mut rx = events.subscribe();
        remote.set_offline(true);

        let saved = gateway.save(&game("alice")).await;
        assert!(saved.id.unwrap().is_local());
        assert!(!gateway.is_online());
        assert_eq!(local.pending().await.len(), 1);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some("connectivity.offline"));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.event.as_deref(), Some("storage.saved_locally"));
        assert_eq!(second.owner_id.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn reconcile_replays_once_without_duplicates() {
        let remote = FlakyStore::default();
        let (gateway, local, _) = gateway(Some(&remote)).await;
        remote.set_offline(true);

        let offline = gateway.save(&game("alice")).await;
        let local_id = offline.id.unwrap();
        assert!(local_id.is_local());

        remote.set_offline(false);
        gateway.set_online(true);
        let report = gateway.reconcile().await;
        assert_eq!(report, SyncReport { synced: 1, failed: 0 });

        let records = remote.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, local_id.into_remote());
        assert!(local.pending().await.is_empty());

        // Nothing left to replay.
        assert_eq!(gateway.reconcile().await, SyncReport::default());
        // Saving the stale local-id copy upserts the same remote record.
        gateway.save(&offline).await;
        assert_eq!(remote.records().len(), 1);
    }

    #[tokio::test]
    async fn failed_replays_stay_pending() {
        let remote = FlakyStore::default();
        let (gateway, local, _) = gateway(Some(&remote)).await;
        remote.set_offline(true);
        gateway.save(&game("alice")).await;

        // Online flag set while the remote still refuses writes.
        gateway.set_online(true);
        let report = gateway.reconcile().await;
        assert_eq!(report, SyncReport { synced: 0, failed: 1 });
        assert_eq!(local.pending().await.len(), 1);
        // Offline again so the next healthy poll triggers another replay.
        assert!(!gateway.is_online());
    }

    #[tokio::test]
    async fn listing_merges_unsynced_local_edits() {
        let remote = FlakyStore::default();
        let (gateway, _, _) = gateway(Some(&remote)).await;
        let mut synced = gateway.save(&game("alice")).await;
        gateway.save(&game("bob")).await;

        remote.set_offline(true);
        synced.ledger.set_score(0, 1, Some(3));
        gateway.save(&synced).await;
        gateway.save(&game("alice")).await;

        // Back online but nothing replayed yet.
        remote.set_offline(false);
        gateway.set_online(true);
        let games = gateway.load("alice").await;
        assert_eq!(games.len(), 2);
        let edited = games
            .iter()
            .find(|g| g.id.map(|id| id.uuid()) == synced.id.map(|id| id.uuid()))
            .unwrap();
        assert_eq!(edited.ledger.total_for(0), 3);
    }

    #[tokio::test]
    async fn offline_listing_reads_the_local_store() {
        let (gateway, _, _) = gateway(None).await;
        gateway.save(&game("alice")).await;
        gateway.save(&game("bob")).await;

        let games = gateway.load("alice").await;
        assert_eq!(games.len(), 1);
        assert!(games[0].is_local_only());
    }

    #[tokio::test]
    async fn deleting_by_local_id_removes_the_reconciled_remote_copy() {
        let remote = FlakyStore::default();
        let (gateway, local, _) = gateway(Some(&remote)).await;
        let online = gateway.save(&game("alice")).await;

        remote.set_offline(true);
        let offline = gateway.save(&game("alice")).await;
        let local_id = offline.id.unwrap();
        remote.set_offline(false);
        gateway.set_online(true);
        gateway.reconcile().await;
        assert_eq!(remote.records().len(), 2);

        gateway.delete(local_id).await;
        assert_eq!(remote.records().len(), 1);
        assert!(local.pending().await.is_empty());
        let listed = gateway.load("alice").await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, online.id);

        gateway.delete(online.id.unwrap()).await;
        assert!(remote.records().is_empty());
        assert!(gateway.find(online.id.unwrap()).await.is_none());
        // Deleting again is harmless.
        gateway.delete(local_id).await;
        assert!(gateway.is_online());
    }

    #[tokio::test]
    async fn unsynced_local_ids_delete_cleanly_while_online() {
        let remote = FlakyStore::default();
        let (gateway, local, _) = gateway(Some(&remote)).await;
        remote.set_offline(true);
        let offline = gateway.save(&game("alice")).await;
        remote.set_offline(false);
        gateway.set_online(true);

        gateway.delete(offline.id.unwrap()).await;
        assert!(remote.records().is_empty());
        assert!(local.pending().await.is_empty());
        assert!(gateway.load("alice").await.is_empty());
    }

    #[tokio::test]
    async fn reconcile_carries_every_offline_edit_to_one_remote_record() {
        let remote = FlakyStore::default();
        let (gateway, _, _) = gateway(Some(&remote)).await;
        remote.set_offline(true);

        let mut game = gateway.save(&game("alice")).await;
        for (hole, strokes) in [(1, 3), (2, 5), (3, 2)] {
            game.ledger.set_score(0, hole, Some(strokes));
            game.current_hole = hole + 1;
            game = gateway.save(&game).await;
        }
        game.ledger.set_score(0, 2, Some(4));
        game = gateway.save(&game).await;
        assert!(game.id.unwrap().is_local());

        remote.set_offline(false);
        gateway.set_online(true);
        assert_eq!(gateway.reconcile().await, SyncReport { synced: 1, failed: 0 });

        let records = remote.records();
        assert_eq!(records.len(), 1);
        let synced = &records[0];
        assert_eq!(synced.id, game.id.unwrap().into_remote());
        assert_eq!(synced.current_hole, 4);
        let strokes: Vec<_> = synced.players[0].strokes.iter().map(|(h, s)| (*h, *s)).collect();
        assert_eq!(strokes, [(1, 3), (2, 4), (3, 2)]);
    }

    #[tokio::test]
    async fn find_prefers_unsynced_local_copies() {
        let remote = FlakyStore::default();
        let (gateway, _, _) = gateway(Some(&remote)).await;
        let mut saved = gateway.save(&game("alice")).await;

        remote.set_offline(true);
        saved.current_hole = 4;
        gateway.save(&saved).await;
        remote.set_offline(false);
        gateway.set_online(true);

        let found = gateway.find(saved.id.unwrap()).await.unwrap();
        assert_eq!(found.current_hole, 4);
    }
}
