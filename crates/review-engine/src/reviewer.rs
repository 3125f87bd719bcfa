//! Game review orchestration.
//!
//! Walks a move list in order, evaluating the position before and after each
//! move through a per-run cache, then classifies the move. A new run
//! supersedes any older one: the older run notices at its next suspension
//! point and returns [`ReviewError::Superseded`] without publishing anything.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chess_core::{pgn, GamePosition, PlayedMove, Side};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::accuracy::{accuracy_for, stats_for, MoveStats};
use crate::cache::PositionCache;
use crate::classification::{classify_move, eval_loss, Classification};
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::evaluation::EvaluationResult;
use crate::oracle::{OracleHandle, PositionEvaluator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSettings {
    pub depth: u32,
    /// Moves with a ply index below this are book moves.
    pub book_plies: usize,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            depth: 15,
            book_plies: 10,
        }
    }
}

impl From<&ReviewConfig> for ReviewSettings {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            depth: config.analysis_depth,
            book_plies: config.book_plies,
        }
    }
}

/// A played move with its review attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewedMove {
    #[serde(flatten)]
    pub played: PlayedMove,
    /// Evaluation of the position after the move.
    pub evaluation: f64,
    pub mate: Option<i32>,
    /// Engine suggestion for the position before the move.
    pub best_move: Option<String>,
    /// `None` when the move could not be replayed.
    pub classification: Option<Classification>,
    pub eval_loss: f64,
    pub analysis_depth: u32,
    /// Engine line from the position after the move.
    pub principal_variation: Vec<String>,
}

impl ReviewedMove {
    /// The move with no review data.
    pub fn unreviewed(played: PlayedMove) -> Self {
        Self {
            played,
            evaluation: 0.0,
            mate: None,
            best_move: None,
            classification: None,
            eval_loss: 0.0,
            analysis_depth: 0,
            principal_variation: Vec::new(),
        }
    }

    pub fn explanation(&self) -> Option<String> {
        let classification = self.classification?;
        let best = self.best_move.as_deref().unwrap_or("-");
        Some(classification.explanation(self.eval_loss, best))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReview {
    pub moves: Vec<ReviewedMove>,
    pub white_accuracy: u32,
    pub black_accuracy: u32,
    pub white_stats: MoveStats,
    pub black_stats: MoveStats,
}

impl GameReview {
    pub fn from_moves(moves: Vec<ReviewedMove>) -> Self {
        Self {
            white_accuracy: accuracy_for(&moves, Side::White),
            black_accuracy: accuracy_for(&moves, Side::Black),
            white_stats: stats_for(&moves, Side::White),
            black_stats: stats_for(&moves, Side::Black),
            moves,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum ReviewStatus {
    #[default]
    Idle,
    /// Percentage of moves processed.
    Running { progress: u8 },
    Completed(Arc<GameReview>),
}

#[derive(Debug, Clone, Copy)]
struct ActiveRun {
    generation: u64,
    fingerprint: u64,
}

/// Clears the active run on exit, however the run ends.
struct RunGuard<'a> {
    active: &'a Mutex<Option<ActiveRun>>,
    status: &'a watch::Sender<ReviewStatus>,
    generation: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.is_some_and(|run| run.generation == self.generation) {
            *active = None;
            // A run dropped mid-flight leaves nothing behind.
            self.status.send_if_modified(|status| {
                if matches!(status, ReviewStatus::Running { .. }) {
                    *status = ReviewStatus::Idle;
                    true
                } else {
                    false
                }
            });
        }
    }
}

pub struct GameReviewer<E = OracleHandle> {
    evaluator: E,
    settings: ReviewSettings,
    generation: AtomicU64,
    active: Mutex<Option<ActiveRun>>,
    status: watch::Sender<ReviewStatus>,
}

impl<E: PositionEvaluator> GameReviewer<E> {
    pub fn new(evaluator: E, settings: ReviewSettings) -> Self {
        let (status, _) = watch::channel(ReviewStatus::Idle);
        Self {
            evaluator,
            settings,
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
            status,
        }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn subscribe(&self) -> watch::Receiver<ReviewStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> ReviewStatus {
        self.status.borrow().clone()
    }

    /// Parse `pgn` and review it. Unparseable input reviews as an empty game.
    pub async fn review_pgn(&self, pgn: &str) -> Result<GameReview, ReviewError> {
        self.review(pgn::moves_from_pgn(pgn)).await
    }

    /// Review a full move list. Supersedes any run in progress, unless that
    /// run is over the same moves, in which case this fails with
    /// [`ReviewError::AlreadyRunning`].
    pub async fn review(&self, moves: Vec<PlayedMove>) -> Result<GameReview, ReviewError> {
        let guard = self.begin(fingerprint(&moves))?;
        let generation = guard.generation;
        let total = moves.len();
        info!(generation, total, depth = self.settings.depth, "Starting review");

        if moves.is_empty() {
            return self.complete(generation, Vec::new());
        }

        let mut board = starting_board(&moves[0]);
        let mut cache = PositionCache::new();
        let mut reviewed = Vec::with_capacity(total);

        for (i, played) in moves.into_iter().enumerate() {
            let (next, annotated) = self
                .review_move(generation, &mut cache, board, played, i)
                .await?;
            board = next;
            reviewed.push(annotated);

            let progress = ((i + 1) as f64 / total as f64 * 100.0).round() as u8;
            self.publish(generation, ReviewStatus::Running { progress })?;
        }

        debug!(generation, positions = cache.len(), "Positions evaluated");
        self.complete(generation, reviewed)
    }

    async fn review_move(
        &self,
        generation: u64,
        cache: &mut PositionCache,
        before: GamePosition,
        played: PlayedMove,
        ply: usize,
    ) -> Result<(GamePosition, ReviewedMove), ReviewError> {
        let depth = self.settings.depth;
        let eval_before = cache.resolve(&self.evaluator, &before, depth).await;
        self.ensure_current(generation)?;

        let (after, details) = match before.play_san(&played.san) {
            Ok(step) => step,
            Err(e) => {
                warn!(
                    generation,
                    ply,
                    san = %played.san,
                    error = %e,
                    "Skipping move that does not replay"
                );
                // Carry on from where the record says the move led.
                let resync = GamePosition::from_fen(&played.fen_after).unwrap_or(before);
                return Ok((resync, ReviewedMove::unreviewed(played)));
            }
        };

        let eval_after = cache.resolve(&self.evaluator, &after, depth).await;
        self.ensure_current(generation)?;

        let matched_best = eval_before.best_move.as_deref().is_some_and(|best| {
            best == details.uci || before.san_for_uci(best).as_deref() == Some(details.san.as_str())
        });

        let side = played.side;
        let classification = classify_move(
            eval_before.evaluation,
            eval_after.evaluation,
            matched_best,
            ply < self.settings.book_plies,
            before.legal_move_count(),
            side,
        );
        debug!(
            ply,
            san = %played.san,
            before = eval_before.evaluation,
            after = eval_after.evaluation,
            ?classification,
            "Classified move"
        );

        let annotated = annotate(played, &eval_before, eval_after, classification);
        Ok((after, annotated))
    }

    /// Register a new run, superseding whatever ran before.
    fn begin(&self, fingerprint: u64) -> Result<RunGuard<'_>, ReviewError> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.is_some_and(|run| run.fingerprint == fingerprint) {
            return Err(ReviewError::AlreadyRunning);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = active.replace(ActiveRun {
            generation,
            fingerprint,
        }) {
            info!(previous = previous.generation, generation, "Superseding running review");
        }
        self.status.send_replace(ReviewStatus::Running { progress: 0 });

        Ok(RunGuard {
            active: &self.active,
            status: &self.status,
            generation,
        })
    }

    fn ensure_current(&self, generation: u64) -> Result<(), ReviewError> {
        if self.generation.load(Ordering::SeqCst) == generation {
            Ok(())
        } else {
            debug!(generation, "Review superseded, discarding results");
            Err(ReviewError::Superseded { generation })
        }
    }

    /// Publish `status` if `generation` is still the current run. Holding the
    /// run lock keeps a newer run from starting between check and send.
    fn publish(&self, generation: u64, status: ReviewStatus) -> Result<(), ReviewError> {
        let _active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        self.ensure_current(generation)?;
        self.status.send_replace(status);
        Ok(())
    }

    fn complete(&self, generation: u64, moves: Vec<ReviewedMove>) -> Result<GameReview, ReviewError> {
        let review = GameReview::from_moves(moves);
        self.publish(generation, ReviewStatus::Completed(Arc::new(review.clone())))?;
        info!(
            generation,
            white_accuracy = review.white_accuracy,
            black_accuracy = review.black_accuracy,
            "Review complete"
        );
        Ok(review)
    }
}

fn annotate(
    played: PlayedMove,
    eval_before: &EvaluationResult,
    eval_after: EvaluationResult,
    classification: Classification,
) -> ReviewedMove {
    let loss = eval_loss(eval_before.evaluation, eval_after.evaluation, played.side);
    ReviewedMove {
        played,
        evaluation: eval_after.evaluation,
        mate: eval_after.mate,
        best_move: eval_before.best_move.clone(),
        classification: Some(classification),
        eval_loss: loss,
        analysis_depth: eval_after.depth,
        principal_variation: eval_after.principal_variation,
    }
}

fn starting_board(first: &PlayedMove) -> GamePosition {
    GamePosition::from_fen(&first.fen_before).unwrap_or_else(|e| {
        warn!(error = %e, "Unreadable starting position, using the initial array");
        GamePosition::starting()
    })
}

/// Identity of a move list for duplicate-run detection.
fn fingerprint(moves: &[PlayedMove]) -> u64 {
    let mut hasher = DefaultHasher::new();
    moves.len().hash(&mut hasher);
    for played in moves {
        played.fen_before.hash(&mut hasher);
        played.san.hash(&mut hasher);
    }
    hasher.finish()
}
