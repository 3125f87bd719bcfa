//! Move classification. Pure functions only.

use chess_core::Side;
use serde::{Deserialize, Serialize};

use crate::evaluation::MATE_SCORE;

/// Loss (in pawns) at which a move stops being "good".
const INACCURACY_THRESHOLD: f64 = 0.3;
const MISTAKE_THRESHOLD: f64 = 1.0;
const BLUNDER_THRESHOLD: f64 = 3.0;

/// A best move that gains at least this much, landing in a decisive
/// position, is brilliant.
const BRILLIANT_GAIN: f64 = 0.5;
const BRILLIANT_MIN_EVAL: f64 = 2.0;

/// A best move is great when it gains this much or lands beyond
/// `GREAT_MIN_EVAL`.
const GREAT_GAIN: f64 = 0.2;
const GREAT_MIN_EVAL: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Brilliant,
    Great,
    Best,
    Book,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    Forced,
}

impl Classification {
    pub const ALL: [Classification; 9] = [
        Classification::Brilliant,
        Classification::Great,
        Classification::Best,
        Classification::Book,
        Classification::Good,
        Classification::Inaccuracy,
        Classification::Mistake,
        Classification::Blunder,
        Classification::Forced,
    ];

    /// Per-move accuracy used for the side averages.
    pub fn accuracy_score(self) -> u32 {
        match self {
            Classification::Brilliant
            | Classification::Best
            | Classification::Book
            | Classification::Forced => 100,
            Classification::Great => 95,
            Classification::Good => 90,
            Classification::Inaccuracy => 75,
            Classification::Mistake => 50,
            Classification::Blunder => 25,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::Brilliant => "Brilliant",
            Classification::Great => "Great Move",
            Classification::Best => "Best Move",
            Classification::Book => "Book",
            Classification::Good => "Good",
            Classification::Inaccuracy => "Inaccuracy",
            Classification::Mistake => "Mistake",
            Classification::Blunder => "Blunder",
            Classification::Forced => "Forced",
        }
    }

    /// Annotation glyph for move lists.
    pub fn symbol(self) -> &'static str {
        match self {
            Classification::Brilliant => "!!",
            Classification::Great => "!",
            Classification::Best => "*",
            Classification::Book => "=",
            Classification::Good => "",
            Classification::Inaccuracy => "?!",
            Classification::Mistake => "?",
            Classification::Blunder => "??",
            Classification::Forced => "[]",
        }
    }

    pub fn explanation(self, eval_loss: f64, best_move: &str) -> String {
        match self {
            Classification::Brilliant => {
                "An exceptional move that outshines every other good option.".to_string()
            }
            Classification::Great => {
                "A very strong move that keeps or extends the advantage.".to_string()
            }
            Classification::Best => "The engine's top choice in this position.".to_string(),
            Classification::Good => "A solid move that holds the position.".to_string(),
            Classification::Book => "A well-known opening move.".to_string(),
            Classification::Forced => "The only legal move in this position.".to_string(),
            Classification::Inaccuracy => {
                format!("This move loses {eval_loss:.1} pawns. Consider {best_move} instead.")
            }
            Classification::Mistake => format!(
                "This move loses {eval_loss:.1} pawns and hands the opponent a better position. \
                 {best_move} was stronger."
            ),
            Classification::Blunder => format!(
                "A critical error that loses {eval_loss:.1} pawns! {best_move} was much better."
            ),
        }
    }
}

/// Evaluation loss from the mover's point of view. Evaluations are White
/// positive, so Black's loss is the evaluation going up.
pub fn eval_loss(eval_before: f64, eval_after: f64, side: Side) -> f64 {
    match side {
        Side::White => eval_before - eval_after,
        Side::Black => eval_after - eval_before,
    }
}

fn is_mate_eval(eval: f64) -> bool {
    eval.abs() >= MATE_SCORE
}

/// Assign exactly one label to a move. Rules apply in order; the first
/// match wins.
pub fn classify_move(
    eval_before: f64,
    eval_after: f64,
    matched_best: bool,
    within_book: bool,
    legal_moves: usize,
    side: Side,
) -> Classification {
    if within_book {
        return Classification::Book;
    }
    if legal_moves == 1 {
        return Classification::Forced;
    }
    // Mate was already on the board; nothing the mover does matters.
    if is_mate_eval(eval_before) {
        return Classification::Forced;
    }

    let loss = eval_loss(eval_before, eval_after, side);

    if is_mate_eval(eval_after) && !matched_best {
        let mated = match side {
            Side::White => eval_after <= -MATE_SCORE,
            Side::Black => eval_after >= MATE_SCORE,
        };
        if mated {
            return Classification::Blunder;
        }
    }

    if matched_best {
        if loss < -BRILLIANT_GAIN && eval_after.abs() > BRILLIANT_MIN_EVAL {
            return Classification::Brilliant;
        }
        if eval_after.abs() > GREAT_MIN_EVAL || loss < -GREAT_GAIN {
            return Classification::Great;
        }
        return Classification::Best;
    }

    // Negative loss (an improving move the engine did not pick) is "good".
    if loss >= BLUNDER_THRESHOLD {
        Classification::Blunder
    } else if loss >= MISTAKE_THRESHOLD {
        Classification::Mistake
    } else if loss >= INACCURACY_THRESHOLD {
        Classification::Inaccuracy
    } else {
        Classification::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_and_forced_take_precedence() {
        for (before, after) in [(0.0, -50.0), (100.0, -100.0), (3.0, 3.0)] {
            assert_eq!(
                classify_move(before, after, false, true, 10, Side::White),
                Classification::Book
            );
            assert_eq!(
                classify_move(before, after, false, false, 1, Side::White),
                Classification::Forced
            );
        }
    }

    #[test]
    fn test_mate_already_on_board_is_forced() {
        assert_eq!(
            classify_move(100.0, 100.0, false, false, 20, Side::White),
            Classification::Forced
        );
        assert_eq!(
            classify_move(-100.0, 0.0, true, false, 20, Side::Black),
            Classification::Forced
        );
    }

    #[test]
    fn test_walking_into_mate_is_blunder() {
        assert_eq!(
            classify_move(0.5, -100.0, false, false, 20, Side::White),
            Classification::Blunder
        );
        assert_eq!(
            classify_move(-0.5, 100.0, false, false, 20, Side::Black),
            Classification::Blunder
        );
        // Finding a mate for yourself is not.
        assert_eq!(
            classify_move(0.5, 100.0, true, false, 20, Side::White),
            Classification::Brilliant
        );
    }

    #[test]
    fn test_engine_move_with_modest_gain_is_great() {
        assert_eq!(
            classify_move(0.5, 1.6, true, false, 20, Side::White),
            Classification::Great
        );
        assert_eq!(
            classify_move(-0.5, -1.6, true, false, 20, Side::Black),
            Classification::Great
        );
    }

    #[test]
    fn test_engine_move_labels() {
        assert_eq!(
            classify_move(0.3, 0.3, true, false, 5, Side::White),
            Classification::Best
        );
        assert_eq!(
            classify_move(1.0, 2.5, true, false, 5, Side::White),
            Classification::Brilliant
        );
        assert_eq!(
            classify_move(0.0, 0.3, true, false, 5, Side::White),
            Classification::Great
        );
        assert_eq!(
            classify_move(1.6, 1.6, true, false, 5, Side::White),
            Classification::Great
        );
        assert_eq!(
            classify_move(-1.0, -2.5, true, false, 5, Side::Black),
            Classification::Brilliant
        );
    }

    #[test]
    fn test_loss_bands() {
        assert_eq!(
            classify_move(1.0, -2.0, false, false, 10, Side::White),
            Classification::Blunder
        );
        assert_eq!(
            classify_move(0.2, -0.5, false, false, 10, Side::White),
            Classification::Inaccuracy
        );
        assert_eq!(
            classify_move(0.0, 1.5, false, false, 10, Side::Black),
            Classification::Mistake
        );
        assert_eq!(
            classify_move(0.0, -0.1, false, false, 10, Side::White),
            Classification::Good
        );
        assert_eq!(
            classify_move(0.0, 2.0, false, false, 10, Side::White),
            Classification::Good
        );
    }

    #[test]
    fn test_every_input_gets_a_label() {
        let evals = [-100.0, -5.0, -1.0, -0.2, 0.0, 0.4, 2.5, 100.0];
        for &before in &evals {
            for &after in &evals {
                for matched in [false, true] {
                    for side in [Side::White, Side::Black] {
                        let c = classify_move(before, after, matched, false, 12, side);
                        assert!(Classification::ALL.contains(&c));
                    }
                }
            }
        }
    }

    #[test]
    fn test_eval_loss_perspective() {
        assert_eq!(eval_loss(1.0, 0.5, Side::White), 0.5);
        assert_eq!(eval_loss(1.0, 0.5, Side::Black), -0.5);
    }

    #[test]
    fn test_accuracy_scores() {
        assert_eq!(Classification::Brilliant.accuracy_score(), 100);
        assert_eq!(Classification::Great.accuracy_score(), 95);
        assert_eq!(Classification::Good.accuracy_score(), 90);
        assert_eq!(Classification::Inaccuracy.accuracy_score(), 75);
        assert_eq!(Classification::Mistake.accuracy_score(), 50);
        assert_eq!(Classification::Blunder.accuracy_score(), 25);
    }

    #[test]
    fn test_explanation_mentions_best_move() {
        let text = Classification::Mistake.explanation(1.25, "Nf3");
        assert!(text.contains("1.2") || text.contains("1.3"));
        assert!(text.contains("Nf3"));
        assert_eq!(Classification::Blunder.symbol(), "??");
    }
}
