pub mod accuracy;
pub mod cache;
pub mod classification;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod oracle;
pub mod reviewer;
pub mod stockfish;
pub mod uci;

pub use accuracy::{accuracy_for, stats_for, MoveStats};
pub use cache::PositionCache;
pub use classification::{classify_move, eval_loss, Classification};
pub use config::ReviewConfig;
pub use error::ReviewError;
pub use evaluation::{evaluation_bar_percent, format_evaluation, EvaluationResult, MATE_SCORE};
pub use oracle::{OracleHandle, OracleSettings, PositionEvaluator};
pub use reviewer::{GameReview, GameReviewer, ReviewSettings, ReviewStatus, ReviewedMove};
pub use stockfish::{EngineChannel, StockfishProcess};
