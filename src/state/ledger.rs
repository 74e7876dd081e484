//! Per-player, per-hole stroke record and the standings derived from it.

use std::collections::BTreeMap;

/// Default lowest recordable stroke count.
pub const DEFAULT_MIN_STROKES: u8 = 1;
/// Default highest recordable stroke count.
pub const DEFAULT_MAX_STROKES: u8 = 15;

/// Inclusive range of stroke counts accepted by [`ScoreLedger::set_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRange {
    min: u8,
    max: u8,
}

impl ScoreRange {
    /// Build a range, swapping the bounds if given in the wrong order and never accepting zero.
    pub fn new(min: u8, max: u8) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: min.max(1),
            max: max.max(1),
        }
    }

    /// Lowest accepted stroke count.
    pub fn min(&self) -> u8 {
        self.min
    }

    /// Highest accepted stroke count.
    pub fn max(&self) -> u8 {
        self.max
    }

    /// Stroke count for `value` when it falls inside the range.
    pub fn accept(&self, value: i64) -> Option<u8> {
        u8::try_from(value)
            .ok()
            .filter(|strokes| (self.min..=self.max).contains(strokes))
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_STROKES, DEFAULT_MAX_STROKES)
    }
}

/// One row of the standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    /// Registration index of the player.
    pub player_index: usize,
    /// Strokes recorded so far.
    pub total: u32,
    /// Whether the player has at least one recorded hole.
    pub has_scores: bool,
}

/// Stroke counts keyed by player index, then by hole number.
///
/// A missing hole entry means "not yet scored". Zero is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLedger {
    range: ScoreRange,
    rows: Vec<BTreeMap<u32, u8>>,
}

impl ScoreLedger {
    /// Empty ledger for `players` players.
    pub fn new(players: usize, range: ScoreRange) -> Self {
        Self {
            range,
            rows: vec![BTreeMap::new(); players],
        }
    }

    /// Rebuild a ledger from persisted rows, one per player.
    ///
    /// Zero entries are dropped since they cannot be recorded.
    pub fn from_rows(rows: Vec<BTreeMap<u32, u8>>, range: ScoreRange) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().filter(|(_, strokes)| *strokes > 0).collect())
            .collect();
        Self { range, rows }
    }

    /// Range used to accept or clear scores.
    pub fn range(&self) -> ScoreRange {
        self.range
    }

    /// Record `value` strokes for a player on a hole.
    ///
    /// Anything that is not an integer inside the configured range clears the
    /// entry instead, so a miskeyed value simply leaves the hole unscored.
    /// Unknown players are ignored. Returns whether the ledger changed.
    pub fn set_score(&mut self, player_index: usize, hole: u32, value: Option<i64>) -> bool {
        let Some(row) = self.rows.get_mut(player_index) else {
            return false;
        };

        match value.and_then(|raw| self.range.accept(raw)) {
            Some(strokes) => row.insert(hole, strokes) != Some(strokes),
            None => row.remove(&hole).is_some(),
        }
    }

    /// Strokes recorded for a player on a hole.
    pub fn score(&self, player_index: usize, hole: u32) -> Option<u8> {
        self.rows.get(player_index)?.get(&hole).copied()
    }

    /// Every recorded hole of a player.
    pub fn row(&self, player_index: usize) -> Option<&BTreeMap<u32, u8>> {
        self.rows.get(player_index)
    }

    /// Sum of the recorded strokes of a player. Unscored holes count as zero.
    pub fn total_for(&self, player_index: usize) -> u32 {
        self.rows
            .get(player_index)
            .map(|row| row.values().map(|strokes| u32::from(*strokes)).sum())
            .unwrap_or(0)
    }

    /// True when every player has a score on `hole`.
    pub fn is_hole_complete(&self, hole: u32) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|row| row.contains_key(&hole))
    }

    /// Players ranked by ascending total.
    ///
    /// Players without any recorded hole rank after everyone who has scored.
    /// Ties keep registration order, so repeated calls give the same order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings = self
            .rows
            .iter()
            .enumerate()
            .map(|(player_index, row)| Standing {
                player_index,
                total: self.total_for(player_index),
                has_scores: !row.is_empty(),
            })
            .collect::<Vec<_>>();

        // `sort_by_key` is stable.
        standings.sort_by_key(|standing| (!standing.has_scores, standing.total));
        standings
    }

    /// Best (lowest) positive total of the round, `None` when nobody has scored.
    pub fn game_total(&self) -> Option<u32> {
        (0..self.rows.len())
            .map(|index| self.total_for(index))
            .filter(|total| *total > 0)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(players: usize) -> ScoreLedger {
        ScoreLedger::new(players, ScoreRange::default())
    }

    #[test]
    fn in_range_scores_read_back_and_sum() {
        let mut ledger = ledger(2);
        assert!(ledger.set_score(0, 1, Some(3)));
        assert!(ledger.set_score(0, 2, Some(15)));
        assert!(ledger.set_score(0, 3, Some(1)));

        assert_eq!(ledger.score(0, 1), Some(3));
        assert_eq!(ledger.score(0, 2), Some(15));
        assert_eq!(ledger.total_for(0), 19);
        assert_eq!(ledger.total_for(1), 0);
    }

    #[test]
    fn out_of_range_values_clear_the_hole() {
        let mut ledger = ledger(1);
        for invalid in [Some(0), Some(16), Some(-3), Some(i64::MAX), None] {
            ledger.set_score(0, 4, Some(5));
            ledger.set_score(0, 4, invalid);
            assert_eq!(ledger.score(0, 4), None, "value {invalid:?} should clear");
        }
        assert_eq!(ledger.total_for(0), 0);
    }

    #[test]
    fn rewriting_the_same_value_reports_no_change() {
        let mut ledger = ledger(1);
        assert!(ledger.set_score(0, 1, Some(4)));
        assert!(!ledger.set_score(0, 1, Some(4)));
        assert!(!ledger.set_score(0, 2, None));
    }

    #[test]
    fn unknown_players_are_ignored() {
        let mut ledger = ledger(1);
        assert!(!ledger.set_score(3, 1, Some(2)));
        assert_eq!(ledger.total_for(3), 0);
    }

    #[test]
    fn custom_ranges_are_honoured() {
        let mut ledger = ScoreLedger::new(1, ScoreRange::new(2, 6));
        ledger.set_score(0, 1, Some(1));
        ledger.set_score(0, 2, Some(7));
        ledger.set_score(0, 3, Some(6));
        assert_eq!(ledger.total_for(0), 6);
    }

    #[test]
    fn hole_completion_tracks_every_player() {
        let mut ledger = ledger(2);
        ledger.set_score(0, 1, Some(2));
        assert!(!ledger.is_hole_complete(1));

        ledger.set_score(1, 1, Some(3));
        assert!(ledger.is_hole_complete(1));
        assert!(!ledger.is_hole_complete(2));
        assert!(!ScoreLedger::new(0, ScoreRange::default()).is_hole_complete(1));
    }

    #[test]
    fn ties_keep_registration_order() {
        let mut ledger = ledger(3);
        ledger.set_score(0, 1, Some(5));
        ledger.set_score(1, 1, Some(3));
        ledger.set_score(2, 1, Some(3));

        for _ in 0..5 {
            let order = ledger
                .standings()
                .iter()
                .map(|s| s.player_index)
                .collect::<Vec<_>>();
            assert_eq!(order, vec![1, 2, 0]);
        }
    }

    #[test]
    fn three_players_nine_holes() {
        let mut ledger = ledger(3);
        for hole in 1..=9 {
            ledger.set_score(0, hole, Some(3));
            ledger.set_score(1, hole, Some(4));
        }

        let standings = ledger.standings();
        let summary = standings
            .iter()
            .map(|s| (s.player_index, s.total))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![(0, 27), (1, 36), (2, 0)]);
        assert!(!standings[2].has_scores);
        assert_eq!(ledger.game_total(), Some(27));
    }

    #[test]
    fn game_total_without_scores_is_none() {
        assert_eq!(ledger(4).game_total(), None);
        assert_eq!(ledger(0).game_total(), None);
    }

    #[test]
    fn persisted_zero_entries_are_dropped() {
        let rows = vec![[(1, 0), (2, 4)].into_iter().collect()];
        let ledger = ScoreLedger::from_rows(rows, ScoreRange::default());
        assert_eq!(ledger.score(0, 1), None);
        assert_eq!(ledger.total_for(0), 4);
    }
}
