use std::time::SystemTime;

use thiserror::Error;

use crate::{
    dao::models::GameId,
    state::{
        game::{Game, GameStatus},
        ledger::Standing,
    },
};

/// Commands the presentation layer can send to a live round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// Move to the next hole, completing the round after the last one.
    Advance,
    /// Move back one hole.
    Retreat,
    /// Move straight to a hole.
    JumpTo(u32),
    /// Record (or clear) strokes for a player on a hole.
    SetScore {
        player_index: usize,
        hole: u32,
        value: Option<i64>,
    },
}

/// Observable result of applying a [`RoundEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The hole pointer moved.
    Moved { from: u32, to: u32 },
    /// The round just switched to completed.
    Completed,
    /// The ledger changed.
    ScoreRecorded,
    /// Nothing changed (no-op navigation or ignored input).
    Unchanged,
}

impl Outcome {
    /// Whether the live state was mutated and must be saved and broadcast.
    pub fn is_change(&self) -> bool {
        !matches!(self, Outcome::Unchanged)
    }
}

/// Rejected navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// Hole navigation is closed once the round is completed.
    #[error("round is completed; hole navigation is closed")]
    Completed,
}

/// Owns the live game and drives its hole pointer and ledger.
///
/// States are `in-progress` and `completed`; completion is terminal for hole
/// navigation. Score corrections stay possible after completion.
#[derive(Debug, Clone)]
pub struct RoundController {
    game: Game,
}

impl RoundController {
    /// Take ownership of a game, normalising its hole pointer.
    pub fn new(mut game: Game) -> Self {
        game.total_holes = game.total_holes.max(1);
        game.current_hole = game.current_hole.clamp(1, game.total_holes);
        Self { game }
    }

    /// Game being played.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Hole being played, 1-based.
    pub fn current_hole(&self) -> u32 {
        self.game.current_hole
    }

    /// Number of holes in the round.
    pub fn total_holes(&self) -> u32 {
        self.game.total_holes
    }

    /// Current lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.game.status
    }

    /// Whether the last hole has been passed.
    pub fn is_completed(&self) -> bool {
        self.game.status == GameStatus::Completed
    }

    /// Apply a command.
    pub fn apply(&mut self, event: RoundEvent) -> Result<Outcome, RoundError> {
        match event {
            RoundEvent::Advance => self.advance(),
            RoundEvent::Retreat => self.retreat(),
            RoundEvent::JumpTo(hole) => self.jump_to(hole),
            RoundEvent::SetScore {
                player_index,
                hole,
                value,
            } => Ok(self.set_score(player_index, hole, value)),
        }
    }

    /// Next hole, or completion when already on the last one.
    pub fn advance(&mut self) -> Result<Outcome, RoundError> {
        self.ensure_in_progress()?;

        let from = self.game.current_hole;
        if from < self.game.total_holes {
            self.game.current_hole += 1;
            Ok(Outcome::Moved {
                from,
                to: self.game.current_hole,
            })
        } else {
            self.game.status = GameStatus::Completed;
            Ok(Outcome::Completed)
        }
    }

    /// Previous hole; no-op on hole 1.
    pub fn retreat(&mut self) -> Result<Outcome, RoundError> {
        self.ensure_in_progress()?;

        let from = self.game.current_hole;
        if from <= 1 {
            return Ok(Outcome::Unchanged);
        }
        self.game.current_hole -= 1;
        Ok(Outcome::Moved {
            from,
            to: self.game.current_hole,
        })
    }

    /// Go to `hole`; holes outside the round are silently ignored.
    pub fn jump_to(&mut self, hole: u32) -> Result<Outcome, RoundError> {
        self.ensure_in_progress()?;

        let from = self.game.current_hole;
        if !(1..=self.game.total_holes).contains(&hole) || hole == from {
            return Ok(Outcome::Unchanged);
        }
        self.game.current_hole = hole;
        Ok(Outcome::Moved { from, to: hole })
    }

    /// Record strokes through the ledger; holes outside the round are ignored.
    pub fn set_score(&mut self, player_index: usize, hole: u32, value: Option<i64>) -> Outcome {
        if !(1..=self.game.total_holes).contains(&hole) {
            return Outcome::Unchanged;
        }
        if self.game.ledger.set_score(player_index, hole, value) {
            Outcome::ScoreRecorded
        } else {
            Outcome::Unchanged
        }
    }

    /// Leaderboard, best total first.
    pub fn standings(&self) -> Vec<Standing> {
        self.game.ledger.standings()
    }

    /// Strokes recorded so far for one player.
    pub fn total_for(&self, player_index: usize) -> u32 {
        self.game.ledger.total_for(player_index)
    }

    /// Adopt the identity of a saved copy without touching scores or the hole pointer.
    ///
    /// The saved copy may be older than the live state, so nothing else is taken from it.
    pub fn record_persisted(&mut self, id: GameId, updated_at: SystemTime) {
        self.game.id = Some(id);
        self.game.updated_at = updated_at;
    }

    fn ensure_in_progress(&self) -> Result<(), RoundError> {
        if self.is_completed() {
            Err(RoundError::Completed)
        } else {
            Ok(())
        }
    }
}
