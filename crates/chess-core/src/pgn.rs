//! PGN parsing: a lightweight regex-based parser that replays the
//! movetext through the rule engine.

use std::sync::LazyLock;

use regex::Regex;

use crate::board::{GamePosition, STANDARD_START_FEN};
use crate::game_data::{GameMetadata, GameRecord, PlayedMove};
use crate::ChessCoreError;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header pattern"));
static HEADER_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("header block pattern"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("comment pattern"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("variation pattern"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"O-O-O[+#]?|O-O[+#]?|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?")
        .expect("move pattern")
});

/// Parse a PGN string into a game record with every ply replayed and
/// annotated with its positions.
pub fn parse_game(pgn: &str) -> Result<GameRecord, ChessCoreError> {
    let metadata = parse_headers(pgn);

    let tokens = extract_moves(pgn);
    if tokens.is_empty() {
        return Err(ChessCoreError::NoMoves);
    }

    let mut board = match metadata.start_fen.as_deref() {
        Some(fen) => GamePosition::from_fen(fen)?,
        None => GamePosition::starting(),
    };

    let mut moves = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        let fen_before = board.fen();
        let side = board.side_to_move();
        let move_number = board.fullmove_number();
        let (next, details) = board.play_san(token)?;

        moves.push(PlayedMove {
            index,
            move_number,
            san: details.san,
            uci: details.uci,
            from: details.from,
            to: details.to,
            promotion: details.promotion,
            side,
            fen_before,
            fen_after: next.fen(),
        });
        board = next;
    }

    Ok(GameRecord { metadata, moves })
}

/// Move list for a PGN, or an empty list if it cannot be parsed.
pub fn moves_from_pgn(pgn: &str) -> Vec<PlayedMove> {
    parse_game(pgn).map(|game| game.moves).unwrap_or_default()
}

fn parse_headers(pgn: &str) -> GameMetadata {
    let mut metadata = GameMetadata {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        ..GameMetadata::default()
    };
    let mut setup = None;
    let mut fen = None;

    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "TimeControl" => metadata.time_control = Some(value),
            "ECO" => metadata.eco = Some(value),
            "Event" => metadata.event = Some(value),
            "Link" => metadata.link = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // A FEN header without SetUp is still honoured; many exporters omit it.
    if setup.as_deref() != Some("0") {
        metadata.start_fen = fen.filter(|f| f.trim() != STANDARD_START_FEN);
    }

    metadata
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_BLOCK_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");

    // Innermost variations first, until no parentheses are left.
    let mut text = no_comments.into_owned();
    while VARIATION_RE.is_match(&text) {
        text = VARIATION_RE.replace_all(&text, "").into_owned();
    }

    MOVE_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}
