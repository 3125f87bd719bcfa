//! Position evaluation results and their display forms.

use chess_core::TerminalState;
use serde::{Deserialize, Serialize};

/// Evaluation magnitude that stands for a forced mate.
pub const MATE_SCORE: f64 = 100.0;

/// Evaluations beyond this many pawns fill the evaluation bar.
const BAR_CLAMP: f64 = 10.0;

/// The oracle's verdict on one position. `evaluation` is in pawns from
/// White's point of view, capped at ±[`MATE_SCORE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub evaluation: f64,
    pub best_move: Option<String>,
    pub principal_variation: Vec<String>,
    pub depth: u32,
    /// Moves to mate, positive when White mates. `Some(0)` means the game
    /// is already over by checkmate.
    pub mate: Option<i32>,
    /// Set when the position is a finished game and no search was run.
    pub terminal: Option<TerminalState>,
}

impl EvaluationResult {
    /// The zero evaluation used whenever the engine cannot be reached.
    pub fn neutral() -> Self {
        Self {
            evaluation: 0.0,
            best_move: None,
            principal_variation: Vec::new(),
            depth: 0,
            mate: None,
            terminal: None,
        }
    }

    /// Synthetic result for a position the rule engine says is over.
    pub fn for_terminal(state: TerminalState) -> Self {
        let (evaluation, mate) = match state {
            TerminalState::Checkmate { winner } => (winner.sign() * MATE_SCORE, Some(0)),
            _ => (0.0, None),
        };
        Self {
            evaluation,
            mate,
            terminal: Some(state),
            ..Self::neutral()
        }
    }
}

/// `+0.3`, `-1.2`, `M3`, `-M2`.
pub fn format_evaluation(evaluation: f64, mate: Option<i32>) -> String {
    match mate {
        Some(m) => {
            let sign = if m < 0 || (m == 0 && evaluation < 0.0) { "-" } else { "" };
            format!("{sign}M{}", m.abs())
        }
        None => {
            let sign = if evaluation >= 0.0 { "+" } else { "" };
            format!("{sign}{evaluation:.1}")
        }
    }
}

/// Share of the evaluation bar (0-100) that belongs to White.
pub fn evaluation_bar_percent(evaluation: f64, mate: Option<i32>) -> f64 {
    if mate.is_some() {
        return if evaluation > 0.0 { 100.0 } else { 0.0 };
    }
    let normalized = evaluation.clamp(-BAR_CLAMP, BAR_CLAMP);
    (50.0 + normalized / BAR_CLAMP * 45.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Side;

    #[test]
    fn test_terminal_results() {
        let mated = EvaluationResult::for_terminal(TerminalState::Checkmate {
            winner: Side::Black,
        });
        assert_eq!(mated.evaluation, -100.0);
        assert_eq!(mated.mate, Some(0));
        assert_eq!(mated.evaluation.abs(), MATE_SCORE);
        assert_eq!(mated.best_move, None);

        let drawn = EvaluationResult::for_terminal(TerminalState::Stalemate);
        assert_eq!(drawn.evaluation, 0.0);
        assert_eq!(drawn.mate, None);
        assert_eq!(drawn.terminal, Some(TerminalState::Stalemate));
    }

    #[test]
    fn test_format_evaluation() {
        assert_eq!(format_evaluation(0.3, None), "+0.3");
        assert_eq!(format_evaluation(0.0, None), "+0.0");
        assert_eq!(format_evaluation(-1.24, None), "-1.2");
        assert_eq!(format_evaluation(100.0, Some(3)), "M3");
        assert_eq!(format_evaluation(-100.0, Some(-2)), "-M2");
        assert_eq!(format_evaluation(-100.0, Some(0)), "-M0");
    }

    #[test]
    fn test_evaluation_bar_percent() {
        assert_eq!(evaluation_bar_percent(0.0, None), 50.0);
        assert_eq!(evaluation_bar_percent(5.0, None), 72.5);
        assert_eq!(evaluation_bar_percent(-25.0, None), 5.0);
        assert_eq!(evaluation_bar_percent(100.0, Some(1)), 100.0);
        assert_eq!(evaluation_bar_percent(-100.0, Some(-4)), 0.0);
    }
}
