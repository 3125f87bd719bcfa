//! Chess rules and game records for the game review engine.
//!
//! - [`board`] wraps `shakmaty` as the move-legality oracle.
//! - [`pgn`] turns movetext into fully populated [`PlayedMove`] records.

pub mod board;
pub mod game_data;
pub mod pgn;

pub use board::{GamePosition, MoveDetails, TerminalState, STANDARD_START_FEN};
pub use game_data::{GameMetadata, GameRecord, PlayedMove, Side};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessCoreError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Unparseable SAN move: {0}")]
    InvalidSan(String),

    #[error("Illegal move {san} in position {fen}")]
    IllegalMove { san: String, fen: String },

    #[error("PGN contains no moves")]
    NoMoves,
}
