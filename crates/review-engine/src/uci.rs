//! Parsing of engine output lines and accumulation of one search's result.

use chess_core::Side;

use crate::evaluation::{EvaluationResult, MATE_SCORE};

/// Score as reported by the engine, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub score: Option<Score>,
    pub pv: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    Info(InfoLine),
    /// `bestmove <move>`; `None` for `(none)` / `0000`.
    BestMove(Option<String>),
    Other,
}

/// Classify one line of engine output.
pub fn parse_line(line: &str) -> EngineLine {
    let trimmed = line.trim();
    if trimmed.starts_with("bestmove") {
        let best = trimmed
            .split_whitespace()
            .nth(1)
            .filter(|m| *m != "(none)" && *m != "0000")
            .map(str::to_string);
        EngineLine::BestMove(best)
    } else if trimmed.starts_with("info") {
        EngineLine::Info(parse_info(trimmed))
    } else {
        EngineLine::Other
    }
}

fn parse_info(line: &str) -> InfoLine {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut info = InfoLine::default();

    let mut i = 0;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                info.depth = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 1;
            }
            "score" => {
                let value = parts.get(i + 2).and_then(|v| v.parse::<i32>().ok());
                info.score = match (parts.get(i + 1).copied(), value) {
                    (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                    _ => info.score,
                };
                i += 2;
            }
            "pv" => {
                // PV runs to the end of the line unless a trailing keyword cuts it
                info.pv = parts[i + 1..]
                    .iter()
                    .take_while(|p| !p.starts_with("bmc") && **p != "string")
                    .map(|p| p.to_string())
                    .collect();
                break;
            }
            _ => {}
        }
        i += 1;
    }

    info
}

/// Parse state for the search currently running. Every `info` line
/// overwrites what it carries; `bestmove` finalizes.
#[derive(Debug, Clone)]
pub struct SearchState {
    side_to_move: Side,
    pv_length: usize,
    depth: u32,
    score: Option<Score>,
    pv: Vec<String>,
    best_move: Option<String>,
}

impl SearchState {
    pub fn new(side_to_move: Side, pv_length: usize) -> Self {
        Self {
            side_to_move,
            pv_length,
            depth: 0,
            score: None,
            pv: Vec::new(),
            best_move: None,
        }
    }

    /// Fold an `info` line in. `depth 0` and `mate 0` lines describe a game
    /// that is already over and are skipped.
    pub fn apply(&mut self, info: &InfoLine) {
        if info.depth == Some(0) || info.score == Some(Score::Mate(0)) {
            return;
        }
        if let Some(depth) = info.depth {
            self.depth = depth;
        }
        if let Some(score) = info.score {
            self.score = Some(score);
        }
        if !info.pv.is_empty() {
            self.pv = info.pv.iter().take(self.pv_length).cloned().collect();
            self.best_move = self.pv.first().cloned();
        }
    }

    pub fn finish(&mut self, best_move: Option<String>) {
        if best_move.is_some() {
            self.best_move = best_move;
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The result so far, converted to White's point of view in pawns.
    pub fn to_result(&self) -> EvaluationResult {
        let sign = self.side_to_move.sign();
        let (evaluation, mate) = match self.score {
            Some(Score::Centipawns(cp)) => {
                let pawns = (cp as f64 / 100.0).clamp(-MATE_SCORE, MATE_SCORE);
                (sign * pawns, None)
            }
            Some(Score::Mate(n)) => {
                let white_mate = if self.side_to_move == Side::White { n } else { -n };
                (white_mate.signum() as f64 * MATE_SCORE, Some(white_mate))
            }
            None => (0.0, None),
        };

        EvaluationResult {
            // + 0.0 turns -0.0 into 0.0
            evaluation: evaluation + 0.0,
            best_move: self.best_move.clone(),
            principal_variation: self.pv.clone(),
            depth: self.depth,
            mate,
            terminal: None,
        }
    }
}
