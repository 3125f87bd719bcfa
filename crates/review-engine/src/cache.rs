//! Per-run memo of position evaluations.

use std::collections::HashMap;

use chess_core::GamePosition;

use crate::evaluation::EvaluationResult;
use crate::oracle::PositionEvaluator;

/// Evaluations of one run keyed by FEN. A run uses one search depth, so a
/// hit is returned whatever depth it was searched at.
#[derive(Debug, Default)]
pub struct PositionCache {
    entries: HashMap<String, EvaluationResult>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached evaluation of `position`, asking `evaluator` only on a miss.
    pub async fn resolve<E: PositionEvaluator>(
        &mut self,
        evaluator: &E,
        position: &GamePosition,
        depth: u32,
    ) -> EvaluationResult {
        let fen = position.fen();
        if let Some(hit) = self.entries.get(&fen) {
            return hit.clone();
        }
        let result = evaluator.evaluate(position, depth).await;
        self.entries.insert(fen, result.clone());
        result
    }

    pub fn get(&self, fen: &str) -> Option<&EvaluationResult> {
        self.entries.get(fen)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
