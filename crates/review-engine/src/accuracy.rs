//! Per-side accuracy and classification tallies over a reviewed game.

use chess_core::Side;
use serde::{Deserialize, Serialize};

use crate::classification::Classification;
use crate::reviewer::ReviewedMove;

/// Score of a move the reviewer could not classify.
const UNCLASSIFIED_SCORE: u32 = 100;

/// Move classification counts for one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveStats {
    pub brilliant: u32,
    pub great: u32,
    pub best: u32,
    pub book: u32,
    pub good: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
    pub forced: u32,
}

impl MoveStats {
    pub fn record(&mut self, classification: Classification) {
        *self.counter(classification) += 1;
    }

    pub fn count(&self, classification: Classification) -> u32 {
        match classification {
            Classification::Brilliant => self.brilliant,
            Classification::Great => self.great,
            Classification::Best => self.best,
            Classification::Book => self.book,
            Classification::Good => self.good,
            Classification::Inaccuracy => self.inaccuracy,
            Classification::Mistake => self.mistake,
            Classification::Blunder => self.blunder,
            Classification::Forced => self.forced,
        }
    }

    pub fn total(&self) -> u32 {
        Classification::ALL.iter().map(|c| self.count(*c)).sum()
    }

    fn counter(&mut self, classification: Classification) -> &mut u32 {
        match classification {
            Classification::Brilliant => &mut self.brilliant,
            Classification::Great => &mut self.great,
            Classification::Best => &mut self.best,
            Classification::Book => &mut self.book,
            Classification::Good => &mut self.good,
            Classification::Inaccuracy => &mut self.inaccuracy,
            Classification::Mistake => &mut self.mistake,
            Classification::Blunder => &mut self.blunder,
            Classification::Forced => &mut self.forced,
        }
    }
}

/// Average per-move accuracy of `side`, rounded to a whole percentage.
/// A side with no moves scores 0.
pub fn accuracy_for(moves: &[ReviewedMove], side: Side) -> u32 {
    let scores: Vec<u32> = moves
        .iter()
        .filter(|m| m.played.side == side)
        .map(|m| {
            m.classification
                .map_or(UNCLASSIFIED_SCORE, Classification::accuracy_score)
        })
        .collect();

    if scores.is_empty() {
        return 0;
    }
    let total: u32 = scores.iter().sum();
    (f64::from(total) / scores.len() as f64).round() as u32
}

pub fn stats_for(moves: &[ReviewedMove], side: Side) -> MoveStats {
    let mut stats = MoveStats::default();
    for classification in moves
        .iter()
        .filter(|m| m.played.side == side)
        .filter_map(|m| m.classification)
    {
        stats.record(classification);
    }
    stats
}
