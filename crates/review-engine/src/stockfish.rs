//! Stockfish engine transport using UCI protocol (async I/O)

use std::future::Future;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::config::ReviewConfig;
use crate::error::ReviewError;

/// A line-oriented duplex channel to a UCI engine.
pub trait EngineChannel {
    /// Write one command line.
    fn send(&mut self, command: &str) -> impl Future<Output = Result<(), ReviewError>> + Send;

    /// Next output line, `None` once the engine has closed its output.
    /// Must be cancellation safe: it is raced against timers and new requests.
    fn recv(&mut self) -> impl Future<Output = Result<Option<String>, ReviewError>> + Send;
}

/// Stockfish child process
pub struct StockfishProcess {
    process: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StockfishProcess {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn spawn(config: &ReviewConfig) -> Result<Self, ReviewError> {
        let mut process = Command::new(&config.stockfish_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ReviewError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| ReviewError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| ReviewError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        tokio::time::timeout(config.engine_init_timeout, engine.handshake(config))
            .await
            .map_err(|_| ReviewError::Stockfish("UCI handshake timed out".into()))??;

        info!(path = %config.stockfish_path, "Stockfish ready");
        Ok(engine)
    }

    async fn handshake(&mut self, config: &ReviewConfig) -> Result<(), ReviewError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        // Configure for analysis
        self.send(&format!("setoption name Threads value {}", config.engine_threads))
            .await?;
        self.send(&format!("setoption name Hash value {}", config.engine_hash_mb))
            .await?;
        self.send("setoption name MultiPV value 1").await?;
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), ReviewError> {
        loop {
            match self.recv().await? {
                Some(line) if line == expected => return Ok(()),
                Some(_) => continue,
                None => {
                    return Err(ReviewError::Stockfish(format!(
                        "Stockfish exited before sending {expected}"
                    )))
                }
            }
        }
    }
}

impl EngineChannel for StockfishProcess {
    async fn send(&mut self, command: &str) -> Result<(), ReviewError> {
        debug!(cmd = command, "SF <");
        self.stdin
            .write_all(format!("{command}\n").as_bytes())
            .await
            .map_err(|e| ReviewError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ReviewError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>, ReviewError> {
        // `Lines::next_line` is cancellation safe
        let line = self
            .stdout
            .next_line()
            .await
            .map_err(|e| ReviewError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        Ok(line.map(|l| {
            let trimmed = l.trim().to_string();
            debug!(line = %trimmed, "SF >");
            trimmed
        }))
    }
}

impl Drop for StockfishProcess {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_missing_binary() {
        let config = ReviewConfig {
            stockfish_path: "/nonexistent/path/to/stockfish".to_string(),
            ..ReviewConfig::default()
        };
        match StockfishProcess::spawn(&config).await {
            Err(ReviewError::Stockfish(msg)) => assert!(msg.contains("Failed to spawn")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("spawning a missing binary should fail"),
        }
    }
}
