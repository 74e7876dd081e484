use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    dao::models::GameId,
    services::{autosave::Autosave, persistence::PersistenceGateway},
    state::{
        game::Game,
        round::{Outcome, RoundController, RoundError, RoundEvent},
    },
};

/// A round currently being played, with its own controller and autosave worker.
pub struct LiveRound {
    id: Uuid,
    owner_id: String,
    controller: Arc<Mutex<RoundController>>,
    autosave: Autosave,
}

impl LiveRound {
    /// Take `game` live under a fresh round id.
    pub fn start(game: Game, gateway: PersistenceGateway, debounce: Duration) -> Self {
        let owner_id = game.owner_id.clone();
        let controller = Arc::new(Mutex::new(RoundController::new(game)));
        let autosave = Autosave::spawn(controller.clone(), gateway, debounce);
        Self {
            id: Uuid::new_v4(),
            owner_id,
            controller,
            autosave,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Apply `event` and, if it changed anything, schedule an autosave.
    ///
    /// `view` runs under the same lock so callers observe exactly the state the
    /// event produced.
    pub async fn apply<R>(
        &self,
        event: RoundEvent,
        view: impl FnOnce(&RoundController) -> R,
    ) -> Result<(Outcome, R), RoundError> {
        let mut controller = self.controller.lock().await;
        let outcome = controller.apply(event)?;
        if outcome.is_change() {
            self.autosave.schedule();
        }
        Ok((outcome, view(&controller)))
    }

    /// Read the controller.
    pub async fn read<R>(&self, view: impl FnOnce(&RoundController) -> R) -> R {
        let controller = self.controller.lock().await;
        view(&controller)
    }

    /// Persisted identifier of the underlying game, if it was saved already.
    pub async fn game_id(&self) -> Option<GameId> {
        self.controller.lock().await.game().id
    }

    /// Save now and wait for it.
    pub async fn flush(&self) {
        self.autosave.flush().await;
    }

    /// Stop autosaving without writing pending changes.
    pub fn discard(&self) {
        self.autosave.cancel();
    }
}
