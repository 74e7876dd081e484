use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, mpsc, oneshot},
    time::{Instant, sleep_until},
};
use tracing::debug;

use crate::{services::persistence::PersistenceGateway, state::round::RoundController};

enum Command {
    /// Restart the quiet period.
    Schedule,
    /// Save now and report back.
    Flush(oneshot::Sender<()>),
    /// Drop any pending save and stop.
    Cancel,
}

/// Debounced saver attached to one live round.
///
/// Every mutation calls [`schedule`]; the round is saved once no further
/// mutation arrives for the configured interval. All saves of a round run on
/// the worker task, one at a time, and always read the controller's current
/// state, so a slow save can never overwrite newer edits with older ones.
/// Dropping the handle saves any pending change before the worker exits.
///
/// [`schedule`]: Autosave::schedule
pub struct Autosave {
    tx: mpsc::UnboundedSender<Command>,
}

impl Autosave {
    /// Spawn the worker for `round`. A zero `debounce` saves on every mutation.
    pub fn spawn(
        round: Arc<Mutex<RoundController>>,
        gateway: PersistenceGateway,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, round, gateway, debounce));
        Self { tx }
    }

    /// Note a mutation, pushing the save back by one debounce interval.
    pub fn schedule(&self) {
        let _ = self.tx.send(Command::Schedule);
    }

    /// Save immediately, cancelling the pending timer, and wait for the save to land.
    pub async fn flush(&self) {
        let (reply, done) = oneshot::channel();
        if self.tx.send(Command::Flush(reply)).is_ok() {
            let _ = done.await;
        }
    }

    /// Stop the worker without saving.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Command>,
    round: Arc<Mutex<RoundController>>,
    gateway: PersistenceGateway,
    debounce: Duration,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        // Only polled when a deadline is set.
        let timer = sleep_until(deadline.unwrap_or_else(Instant::now));

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Schedule) if debounce.is_zero() => {
                    deadline = None;
                    persist(&round, &gateway).await;
                }
                Some(Command::Schedule) => deadline = Some(Instant::now() + debounce),
                Some(Command::Flush(reply)) => {
                    deadline = None;
                    persist(&round, &gateway).await;
                    let _ = reply.send(());
                }
                Some(Command::Cancel) => {
                    debug!("autosave cancelled");
                    break;
                }
                None => {
                    if deadline.take().is_some() {
                        persist(&round, &gateway).await;
                    }
                    break;
                }
            },
            _ = timer, if deadline.is_some() => {
                deadline = None;
                persist(&round, &gateway).await;
            }
        }
    }
}

async fn persist(round: &Mutex<RoundController>, gateway: &PersistenceGateway) {
    let snapshot = round.lock().await.game().clone();
    let saved = gateway.save(&snapshot).await;
    if let Some(id) = saved.id {
        round.lock().await.record_persisted(id, saved.updated_at);
        debug!(game_id = %id, "autosave completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::game_store::{local::LocalGameStore, testing::FlakyStore},
        state::{
            SseHub,
            game::{Game, Player, PlayerColor},
            ledger::ScoreRange,
        },
    };

    async fn setup(debounce: Duration) -> (Arc<Mutex<RoundController>>, Autosave, FlakyStore) {
        let remote = FlakyStore::default();
        let gateway = PersistenceGateway::new(
            LocalGameStore::in_memory(),
            ScoreRange::default(),
            SseHub::default(),
        );
        gateway.install_remote(remote.as_store()).await;
        gateway.set_online(true);

        let game = Game::new(
            "alice".into(),
            "Dunes".into(),
            vec![Player {
                name: "Ada".into(),
                color: PlayerColor::new("red"),
            }],
            9,
            ScoreRange::default(),
        );
        let round = Arc::new(Mutex::new(RoundController::new(game)));
        let autosave = Autosave::spawn(round.clone(), gateway, debounce);
        (round, autosave, remote)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_mutations_collapse_into_one_save() {
        let (round, autosave, remote) = setup(Duration::from_secs(3)).await;

        for hole in 1..=5 {
            round.lock().await.set_score(0, hole, Some(2));
            autosave.schedule();
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(remote.saves(), 0);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(remote.saves(), 1);
        assert_eq!(remote.records()[0].players[0].strokes.len(), 5);
        assert!(round.lock().await.game().id.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_saves_without_waiting_for_the_timer() {
        let (round, autosave, remote) = setup(Duration::from_secs(3)).await;
        round.lock().await.advance().unwrap();
        autosave.schedule();

        autosave.flush().await;
        assert_eq!(remote.saves(), 1);
        assert_eq!(remote.records()[0].current_hole, 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(remote.saves(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_debounce_saves_every_mutation() {
        let (_round, autosave, remote) = setup(Duration::ZERO).await;
        autosave.schedule();
        autosave.schedule();
        autosave.flush().await;
        assert_eq!(remote.saves(), 3);
        assert_eq!(remote.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_save() {
        let (_round, autosave, remote) = setup(Duration::from_secs(3)).await;
        autosave.schedule();
        autosave.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(remote.saves(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_saves_pending_changes() {
        let (_round, autosave, remote) = setup(Duration::from_secs(3)).await;
        autosave.schedule();
        drop(autosave);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(remote.saves(), 1);
    }
}
