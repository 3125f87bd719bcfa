//! Rule-engine oracle over `shakmaty`: positions, legality, terminal states.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

use crate::game_data::Side;
use crate::ChessCoreError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmove clock at which the fifty-move rule ends the game.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// How a game ended on the board itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminalState {
    Checkmate { winner: Side },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
}

/// What the rule engine reports about a move it just played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDetails {
    pub san: String,
    pub uci: String,
    pub from: String,
    pub to: String,
    pub promotion: Option<char>,
}

#[derive(Debug, Clone)]
pub struct GamePosition {
    pos: Chess,
}

impl Default for GamePosition {
    fn default() -> Self {
        Self::starting()
    }
}

impl GamePosition {
    pub fn starting() -> Self {
        Self {
            pos: Chess::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessCoreError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| ChessCoreError::InvalidFen(format!("{fen}: {e}")))?;
        let pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| ChessCoreError::InvalidFen(format!("{fen}: {e}")))?;
        Ok(Self { pos })
    }

    /// Canonical FEN, used as the position key.
    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    pub fn side_to_move(&self) -> Side {
        side_from_color(self.pos.turn())
    }

    pub fn fullmove_number(&self) -> u32 {
        u32::from(self.pos.fullmoves())
    }

    pub fn legal_move_count(&self) -> usize {
        self.pos.legal_moves().len()
    }

    /// `None` while the game can continue.
    pub fn terminal_state(&self) -> Option<TerminalState> {
        if self.pos.is_checkmate() {
            Some(TerminalState::Checkmate {
                winner: self.side_to_move().opponent(),
            })
        } else if self.pos.is_stalemate() {
            Some(TerminalState::Stalemate)
        } else if self.pos.is_insufficient_material() {
            Some(TerminalState::InsufficientMaterial)
        } else if self.pos.halfmoves() >= FIFTY_MOVE_HALFMOVES {
            Some(TerminalState::FiftyMoveRule)
        } else {
            None
        }
    }

    /// Play a SAN move (annotations and check suffixes are tolerated) and
    /// return the resulting position.
    pub fn play_san(&self, token: &str) -> Result<(GamePosition, MoveDetails), ChessCoreError> {
        let bare = strip_annotations(token);
        let san: San = bare
            .parse()
            .map_err(|_| ChessCoreError::InvalidSan(token.to_string()))?;
        let mv = san
            .to_move(&self.pos)
            .map_err(|_| ChessCoreError::IllegalMove {
                san: token.to_string(),
                fen: self.fen(),
            })?;
        Ok(self.play(&mv))
    }

    /// SAN (with suffix) of an engine-notation move in this position, or
    /// `None` when the text is not a legal move here.
    pub fn san_for_uci(&self, uci: &str) -> Option<String> {
        let parsed: UciMove = uci.parse().ok()?;
        let mv = parsed.to_move(&self.pos).ok()?;
        Some(self.play(&mv).1.san)
    }

    fn play(&self, mv: &Move) -> (GamePosition, MoveDetails) {
        let san = San::from_move(&self.pos, mv.clone()).to_string();
        let (from, to, promotion) = match mv.to_uci(CastlingMode::Standard) {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => (from.to_string(), to.to_string(), promotion.map(|r| r.char())),
            _ => (String::new(), mv.to().to_string(), None),
        };

        let mut next = self.pos.clone();
        next.play_unchecked(mv.clone());

        let suffix = if next.is_checkmate() {
            "#"
        } else if next.is_check() {
            "+"
        } else {
            ""
        };

        let uci = match promotion {
            Some(p) => format!("{from}{to}{p}"),
            None => format!("{from}{to}"),
        };

        let details = MoveDetails {
            san: format!("{san}{suffix}"),
            uci,
            from,
            to,
            promotion,
        };
        (GamePosition { pos: next }, details)
    }
}

fn side_from_color(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

/// Drop check/mate suffixes and NAG-style annotations (`!`, `?`).
fn strip_annotations(token: &str) -> &str {
    token.trim().trim_end_matches(['+', '#', '!', '?'])
}
