use serde::{Deserialize, Serialize};

/// Side to move / owner of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// +1.0 for White, -1.0 for Black. Multiplies a side-relative score into
    /// a White-positive one.
    pub fn sign(self) -> f64 {
        match self {
            Side::White => 1.0,
            Side::Black => -1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub event: Option<String>,
    pub link: Option<String>,
    /// Starting position when the game did not begin from the initial array.
    pub start_fen: Option<String>,
}

/// One ply of a parsed game, with everything the rule engine can tell us
/// about it. Analysis fields are added downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayedMove {
    /// 0-based ply index.
    pub index: usize,
    /// Full-move number as printed in movetext.
    pub move_number: u32,
    /// Canonical SAN including the `+` / `#` suffix.
    pub san: String,
    /// Engine notation: from square, to square, optional promotion letter.
    pub uci: String,
    pub from: String,
    pub to: String,
    pub promotion: Option<char>,
    pub side: Side,
    pub fen_before: String,
    pub fen_after: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    pub moves: Vec<PlayedMove>,
}
