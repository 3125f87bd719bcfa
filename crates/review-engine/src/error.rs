//! Review error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("A review of this move list is already running")]
    AlreadyRunning,

    #[error("Review run {generation} was superseded by a newer run")]
    Superseded { generation: u64 },
}
