use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::GameId,
    dto::round::{RoundSnapshot, StandingEntry},
    error::ServiceError,
    services::sse_events,
    state::{
        LiveRound, SharedState,
        game::Game,
        round::RoundEvent,
    },
};

/// Take `game` live and register the round. With `persist_now` the game is
/// saved before returning so the snapshot carries its id.
pub(crate) async fn start_round(state: &SharedState, game: Game, persist_now: bool) -> RoundSnapshot {
    let round = Arc::new(LiveRound::start(
        game,
        state.gateway().clone(),
        state.config().autosave_debounce(),
    ));
    if persist_now {
        round.flush().await;
    }

    state.rounds().insert(round.id(), round.clone());
    info!(round_id = %round.id(), owner_id = round.owner_id(), "round opened");
    build_snapshot(state, &round).await
}

pub(crate) async fn build_snapshot(state: &SharedState, round: &LiveRound) -> RoundSnapshot {
    round
        .read(|controller| RoundSnapshot::build(round.id(), controller, state.config()))
        .await
}

/// Current state of a live round.
pub async fn snapshot(
    state: &SharedState,
    owner_id: &str,
    round_id: Uuid,
) -> Result<RoundSnapshot, ServiceError> {
    let round = live_round(state, owner_id, round_id)?;
    Ok(build_snapshot(state, &round).await)
}

/// Apply a navigation or scoring command, then broadcast and schedule an autosave if anything changed.
pub async fn apply_event(
    state: &SharedState,
    owner_id: &str,
    round_id: Uuid,
    event: RoundEvent,
) -> Result<RoundSnapshot, ServiceError> {
    let round = live_round(state, owner_id, round_id)?;
    let (outcome, snapshot) = round
        .apply(event, |controller| {
            RoundSnapshot::build(round.id(), controller, state.config())
        })
        .await?;

    if outcome.is_change() {
        sse_events::broadcast_round_updated(state.events(), owner_id, &snapshot);
    }
    Ok(snapshot)
}

/// Leaderboard of a live round.
pub async fn standings(
    state: &SharedState,
    owner_id: &str,
    round_id: Uuid,
) -> Result<Vec<StandingEntry>, ServiceError> {
    Ok(snapshot(state, owner_id, round_id).await?.standings)
}

/// Save the round immediately and release it.
pub async fn save_and_exit(
    state: &SharedState,
    owner_id: &str,
    round_id: Uuid,
) -> Result<RoundSnapshot, ServiceError> {
    let round = live_round(state, owner_id, round_id)?;
    round.flush().await;
    state.rounds().remove(&round_id);

    let snapshot = build_snapshot(state, &round).await;
    let game_id = round.game_id().await;
    sse_events::broadcast_round_closed(state.events(), owner_id, round_id, game_id);
    info!(%round_id, game_id = ?game_id.map(|id| id.to_string()), "round saved and closed");
    Ok(snapshot)
}

/// Open round of `owner_id` on `game_id`, matching local and remote forms of the id.
pub(crate) async fn live_round_for_game(
    state: &SharedState,
    owner_id: &str,
    game_id: GameId,
) -> Option<Arc<LiveRound>> {
    for round in owner_rounds(state, owner_id) {
        if round.game_id().await.map(|id| id.uuid()) == Some(game_id.uuid()) {
            return Some(round);
        }
    }
    None
}

/// Live state of every open round of `owner_id`, keyed by round id.
pub(crate) async fn live_rounds_of(state: &SharedState, owner_id: &str) -> Vec<(Uuid, Game)> {
    let mut games = Vec::new();
    for round in owner_rounds(state, owner_id) {
        let game = round.read(|controller| controller.game().clone()).await;
        games.push((round.id(), game));
    }
    games
}

fn owner_rounds(state: &SharedState, owner_id: &str) -> Vec<Arc<LiveRound>> {
    state
        .rounds()
        .iter()
        .filter(|entry| entry.value().owner_id() == owner_id)
        .map(|entry| entry.value().clone())
        .collect()
}

fn live_round(
    state: &SharedState,
    owner_id: &str,
    round_id: Uuid,
) -> Result<Arc<LiveRound>, ServiceError> {
    state
        .rounds()
        .get(&round_id)
        .map(|entry| entry.value().clone())
        .filter(|round| round.owner_id() == owner_id)
        .ok_or_else(|| ServiceError::NotFound(format!("round `{round_id}` not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::local::LocalGameStore,
        state::{
            AppState,
            game::{Player, PlayerColor},
            ledger::ScoreRange,
        },
    };

    fn state() -> SharedState {
        AppState::new(AppConfig::default(), LocalGameStore::in_memory())
    }

    fn game(holes: u32) -> Game {
        let players = [("Ada", "red"), ("Grace", "blue"), ("Linus", "green")]
            .into_iter()
            .map(|(name, color)| Player {
                name: name.into(),
                color: PlayerColor::new(color),
            })
            .collect();
        Game::new("alice".into(), "Seaside".into(), players, holes, ScoreRange::default())
    }

    fn score(player_index: usize, hole: u32, value: i64) -> RoundEvent {
        RoundEvent::SetScore {
            player_index,
            hole,
            value: Some(value),
        }
    }

    #[tokio::test]
    async fn nine_hole_round_ranks_players_by_total() {
        let state = state();
        let round_id = start_round(&state, game(9), false).await.round_id;

        let strokes = [[3, 4, 2, 5, 3, 4, 2, 3, 4], [2, 3, 3, 4, 2, 3, 3, 2, 3], [4, 5, 3, 6, 4, 5, 3, 4, 5]];
        for hole in 1..=9u32 {
            for (player, row) in strokes.iter().enumerate() {
                apply_event(&state, "alice", round_id, score(player, hole, row[hole as usize - 1]))
                    .await
                    .unwrap();
            }
            apply_event(&state, "alice", round_id, RoundEvent::Advance)
                .await
                .unwrap();
        }

        let snapshot = snapshot(&state, "alice", round_id).await.unwrap();
        assert_eq!(snapshot.status, crate::dto::game::GameStatusDto::Completed);
        let totals: Vec<_> = snapshot.standings.iter().map(|s| (s.name.as_str(), s.total)).collect();
        assert_eq!(totals, [("Grace", 25), ("Ada", 30), ("Linus", 39)]);
        assert_eq!(snapshot.best_score, Some(25));

        let err = apply_event(&state, "alice", round_id, RoundEvent::Advance)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn changes_are_broadcast_to_the_owner_only_when_something_changed() {
        let state = state();
        let round_id = start_round(&state, game(9), false).await.round_id;
        let mut rx = state.events().subscribe();

        apply_event(&state, "alice", round_id, RoundEvent::Retreat)
            .await
            .unwrap();
        apply_event(&state, "alice", round_id, score(0, 1, 99))
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        apply_event(&state, "alice", round_id, score(0, 1, 3))
            .await
            .unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("round.updated"));
        assert!(event.is_visible_to("alice"));
        assert!(!event.is_visible_to("bob"));
    }

    #[tokio::test]
    async fn rounds_are_private_to_their_owner() {
        let state = state();
        let round_id = start_round(&state, game(9), false).await.round_id;

        assert!(matches!(
            snapshot(&state, "bob", round_id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            apply_event(&state, "bob", round_id, RoundEvent::Advance).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_debounce_saves_each_change_right_away() {
        let config = AppConfig::default().with_autosave_debounce(std::time::Duration::ZERO);
        let state = AppState::new(config, LocalGameStore::in_memory());
        let round_id = start_round(&state, game(9), false).await.round_id;

        apply_event(&state, "alice", round_id, score(1, 1, 4))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let saved = state.gateway().load("alice").await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].ledger.total_for(1), 4);
    }

    #[tokio::test]
    async fn save_and_exit_persists_and_releases_the_round() {
        let state = state();
        let round_id = start_round(&state, game(9), false).await.round_id;
        apply_event(&state, "alice", round_id, RoundEvent::JumpTo(4))
            .await
            .unwrap();

        let closed = save_and_exit(&state, "alice", round_id).await.unwrap();
        assert!(closed.game_id.is_some());
        assert!(state.rounds().is_empty());
        assert!(matches!(
            save_and_exit(&state, "alice", round_id).await,
            Err(ServiceError::NotFound(_))
        ));

        let saved = state.gateway().load("alice").await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].current_hole, 4);
    }
}
