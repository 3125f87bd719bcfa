//! Review configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ReviewError;

#[derive(Clone, Debug)]
pub struct ReviewConfig {
    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// `go depth` used for every position
    pub analysis_depth: u32,

    /// Upper bound on a single position search before partial results are used
    pub eval_timeout: Duration,

    /// Bound on the UCI handshake when spawning the engine
    pub engine_init_timeout: Duration,

    /// Plies treated as opening theory
    pub book_plies: usize,

    /// Principal variation tokens kept per position
    pub pv_length: usize,

    pub engine_hash_mb: u32,
    pub engine_threads: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            stockfish_path: "/usr/local/bin/stockfish".to_string(),
            analysis_depth: 15,
            eval_timeout: Duration::from_secs(30),
            engine_init_timeout: Duration::from_secs(10),
            book_plies: 10,
            pv_length: 5,
            engine_hash_mb: 128,
            engine_threads: 1,
        }
    }
}

impl ReviewConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Result<Self, ReviewError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ReviewError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            stockfish_path: lookup("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            analysis_depth: parse_var(&lookup, "ANALYSIS_DEPTH").unwrap_or(defaults.analysis_depth),
            eval_timeout: parse_var(&lookup, "EVAL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.eval_timeout),
            engine_init_timeout: parse_var(&lookup, "ENGINE_INIT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.engine_init_timeout),
            book_plies: parse_var(&lookup, "BOOK_PLIES").unwrap_or(defaults.book_plies),
            pv_length: parse_var(&lookup, "PV_LENGTH").unwrap_or(defaults.pv_length),
            engine_hash_mb: parse_var(&lookup, "ENGINE_HASH_MB").unwrap_or(defaults.engine_hash_mb),
            engine_threads: parse_var(&lookup, "ENGINE_THREADS").unwrap_or(defaults.engine_threads),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.analysis_depth == 0 {
            return Err(ReviewError::Config("ANALYSIS_DEPTH must be positive"));
        }
        if self.pv_length == 0 {
            return Err(ReviewError::Config("PV_LENGTH must be positive"));
        }
        Ok(())
    }
}

/// A variable parsed straight into its target type. Out-of-range values
/// count as unparseable.
fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
