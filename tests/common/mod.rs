#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess_core::GamePosition;
use review_engine::{EngineChannel, EvaluationResult, PositionEvaluator, ReviewError};

/// How the fake engine answers `go` for one position.
#[derive(Debug, Clone)]
pub enum Script {
    /// Print these lines, which should end in `bestmove`.
    Complete(Vec<String>),
    /// Print these lines, then wait for `stop` and answer with `bestmove`.
    Hang { lines: Vec<String>, bestmove: String },
    /// Print these lines and ignore `stop`. `late` is printed at the start of
    /// the next search, as a slow engine would.
    Deaf { lines: Vec<String>, late: Vec<String> },
}

pub fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|l| l.to_string()).collect()
}

/// In-process stand-in for a UCI engine, scripted per FEN.
pub struct ScriptedEngine {
    scripts: HashMap<String, Script>,
    output: VecDeque<String>,
    pending_stop: Option<String>,
    late: Vec<String>,
    position: Option<String>,
    closed: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            output: VecDeque::new(),
            pending_stop: None,
            late: Vec::new(),
            position: None,
            closed: false,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An engine whose pipes are already gone.
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::new()
        }
    }

    pub fn script(mut self, fen: &str, script: Script) -> Self {
        self.scripts.insert(fen.to_string(), script);
        self
    }

    /// Shared view of every command the engine received.
    pub fn command_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }

    fn go(&mut self, command: &str) {
        self.output.extend(self.late.drain(..));

        let script = self
            .position
            .as_ref()
            .and_then(|fen| self.scripts.get(fen))
            .cloned();
        match script {
            Some(Script::Complete(lines)) => self.output.extend(lines),
            Some(Script::Hang { lines, bestmove }) => {
                self.output.extend(lines);
                self.pending_stop = Some(bestmove);
            }
            Some(Script::Deaf { lines, late }) => {
                self.output.extend(lines);
                self.late = late;
            }
            None => {
                let depth = command.rsplit(' ').next().unwrap_or("1");
                self.output
                    .push_back(format!("info depth {depth} score cp 0"));
                self.output.push_back("bestmove (none)".to_string());
            }
        }
    }
}

impl EngineChannel for ScriptedEngine {
    async fn send(&mut self, command: &str) -> Result<(), ReviewError> {
        if self.closed {
            return Err(ReviewError::Stockfish("engine closed".to_string()));
        }
        self.log.lock().unwrap().push(command.to_string());

        if let Some(fen) = command.strip_prefix("position fen ") {
            self.position = Some(fen.to_string());
        } else if command.starts_with("go") {
            self.go(command);
        } else if command == "stop" {
            if let Some(best) = self.pending_stop.take() {
                self.output.push_back(format!("bestmove {best}"));
            }
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>, ReviewError> {
        if let Some(line) = self.output.pop_front() {
            return Ok(Some(line));
        }
        if self.closed {
            return Ok(None);
        }
        std::future::pending().await
    }
}

/// Evaluator answering from a FEN table, neutral for anything else.
#[derive(Default)]
pub struct TableEvaluator {
    results: HashMap<String, EvaluationResult>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl TableEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, fen: &str, evaluation: f64, best_move: Option<&str>) -> Self {
        self.results.insert(
            fen.to_string(),
            EvaluationResult {
                evaluation,
                best_move: best_move.map(str::to_string),
                depth: 15,
                ..EvaluationResult::neutral()
            },
        );
        self
    }

    pub fn with_mate(mut self, fen: &str, mate: i32) -> Self {
        self.results.insert(
            fen.to_string(),
            EvaluationResult {
                evaluation: mate.signum() as f64 * review_engine::MATE_SCORE,
                mate: Some(mate),
                depth: 15,
                ..EvaluationResult::neutral()
            },
        );
        self
    }

    /// Make every evaluation take `delay`.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PositionEvaluator for TableEvaluator {
    async fn evaluate(&self, position: &GamePosition, depth: u32) -> EvaluationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.results
            .get(&position.fen())
            .cloned()
            .unwrap_or_else(|| EvaluationResult {
                depth,
                ..EvaluationResult::neutral()
            })
    }
}

/// FEN reached by playing `san` moves from the initial array.
pub fn fen_after(san: &[&str]) -> String {
    let mut position = GamePosition::starting();
    for token in san {
        position = position.play_san(token).unwrap().0;
    }
    position.fen()
}
