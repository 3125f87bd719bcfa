//! Evaluation oracle.
//!
//! One engine process serves every caller. The engine is owned by a worker
//! task; callers talk to it through a cloneable [`OracleHandle`] by sending a
//! request and awaiting the reply. The worker searches one position at a
//! time and a newer request always preempts the running search. Every search
//! is bounded by a timeout, after which whatever the engine reported so far
//! is returned. Positions that are already finished games never reach the
//! engine.

use std::future::Future;
use std::time::Duration;

use chess_core::{GamePosition, Side};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::evaluation::EvaluationResult;
use crate::stockfish::EngineChannel;
use crate::uci::{parse_line, EngineLine, SearchState};

/// Requests buffered ahead of the running search.
const REQUEST_QUEUE: usize = 16;

/// Anything that can turn a position into an evaluation. Never fails: an
/// evaluator that cannot do its job returns [`EvaluationResult::neutral`].
pub trait PositionEvaluator {
    fn evaluate(
        &self,
        position: &GamePosition,
        depth: u32,
    ) -> impl Future<Output = EvaluationResult> + Send;
}

#[derive(Debug, Clone)]
pub struct OracleSettings {
    /// Bound on one search.
    pub timeout: Duration,
    /// How long to wait for `bestmove` after sending `stop`.
    pub stop_grace: Duration,
    pub pv_length: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            stop_grace: Duration::from_secs(2),
            pv_length: 5,
        }
    }
}

impl From<&ReviewConfig> for OracleSettings {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            timeout: config.eval_timeout,
            pv_length: config.pv_length,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct EvaluationRequest {
    fen: String,
    side_to_move: Side,
    depth: u32,
    reply: oneshot::Sender<EvaluationResult>,
}

/// Cloneable client side of the oracle.
#[derive(Debug, Clone)]
pub struct OracleHandle {
    requests: Option<mpsc::Sender<EvaluationRequest>>,
}

impl OracleHandle {
    /// Start a worker task that owns `channel`. Must be called inside a
    /// tokio runtime.
    pub fn spawn<C>(channel: C, settings: OracleSettings) -> Self
    where
        C: EngineChannel + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let worker = OracleWorker {
            channel,
            requests: rx,
            settings,
            owed_bestmoves: 0,
        };
        tokio::spawn(worker.run());
        Self { requests: Some(tx) }
    }

    /// A handle with no engine behind it. Every evaluation is neutral.
    pub fn unavailable() -> Self {
        Self { requests: None }
    }

    pub fn is_available(&self) -> bool {
        self.requests.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

impl PositionEvaluator for OracleHandle {
    async fn evaluate(&self, position: &GamePosition, depth: u32) -> EvaluationResult {
        if let Some(state) = position.terminal_state() {
            debug!(?state, "terminal position, skipping engine");
            return EvaluationResult::for_terminal(state);
        }

        let Some(requests) = &self.requests else {
            return EvaluationResult::neutral();
        };

        let (reply, response) = oneshot::channel();
        let request = EvaluationRequest {
            fen: position.fen(),
            side_to_move: position.side_to_move(),
            depth,
            reply,
        };

        if requests.send(request).await.is_err() {
            warn!("Evaluation oracle is gone, using neutral evaluation");
            return EvaluationResult::neutral();
        }

        response.await.unwrap_or_else(|_| {
            warn!("Evaluation oracle dropped a request, using neutral evaluation");
            EvaluationResult::neutral()
        })
    }
}

enum SearchEvent {
    Line(Result<Option<String>, ReviewError>),
    TimedOut,
    Request(Option<EvaluationRequest>),
}

struct OracleWorker<C> {
    channel: C,
    requests: mpsc::Receiver<EvaluationRequest>,
    settings: OracleSettings,
    /// `bestmove` lines still to come from searches we gave up waiting on.
    /// Everything the engine prints before them is stale.
    owed_bestmoves: usize,
}

impl<C: EngineChannel + Send + 'static> OracleWorker<C> {
    async fn run(mut self) {
        let mut pending = None;
        loop {
            let request = match pending.take() {
                Some(request) => request,
                None => match self.requests.recv().await {
                    Some(request) => request,
                    None => break,
                },
            };
            pending = self.search(request).await;
        }
        debug!("Evaluation oracle stopped");
    }

    /// Run one search to completion, timeout or preemption. Returns the
    /// request that preempted it, if any.
    async fn search(&mut self, request: EvaluationRequest) -> Option<EvaluationRequest> {
        let EvaluationRequest {
            fen,
            side_to_move,
            depth,
            reply,
        } = request;
        let mut reply = Some(reply);
        let mut state = SearchState::new(side_to_move, self.settings.pv_length);

        if let Err(e) = self.start(&fen, depth).await {
            warn!(error = %e, "Failed to submit position, using neutral evaluation");
            if let Some(reply) = reply.take() {
                let _ = reply.send(EvaluationResult::neutral());
            }
            return None;
        }

        let deadline = tokio::time::sleep(self.settings.timeout);
        tokio::pin!(deadline);

        let mut preempted_by = None;
        loop {
            let event = tokio::select! {
                line = self.channel.recv() => SearchEvent::Line(line),
                _ = &mut deadline => SearchEvent::TimedOut,
                incoming = self.requests.recv() => SearchEvent::Request(incoming),
            };

            match event {
                SearchEvent::Line(Ok(Some(line))) => {
                    let parsed = parse_line(&line);
                    if self.skip_stale(&parsed) {
                        continue;
                    }
                    match parsed {
                        EngineLine::Info(info) => state.apply(&info),
                        EngineLine::BestMove(best) => {
                            state.finish(best);
                            break;
                        }
                        EngineLine::Other => {}
                    }
                }
                SearchEvent::Line(Ok(None)) => {
                    warn!(%fen, "Engine output closed mid-search");
                    break;
                }
                SearchEvent::Line(Err(e)) => {
                    warn!(%fen, error = %e, "Engine read failed mid-search");
                    break;
                }
                SearchEvent::TimedOut => {
                    warn!(%fen, depth = state.depth(), "Search timed out, using partial result");
                    // The deadline bounds the caller's wait, not the cleanup.
                    if let Some(reply) = reply.take() {
                        let _ = reply.send(state.to_result());
                    }
                    self.halt(&mut state).await;
                    break;
                }
                SearchEvent::Request(incoming) => {
                    debug!(%fen, "Search preempted");
                    self.halt(&mut state).await;
                    preempted_by = incoming;
                    break;
                }
            }
        }

        // The caller may have given up; nothing to do then.
        if let Some(reply) = reply {
            let _ = reply.send(state.to_result());
        }
        preempted_by
    }

    async fn start(&mut self, fen: &str, depth: u32) -> Result<(), ReviewError> {
        self.channel.send(&format!("position fen {fen}")).await?;
        self.channel.send(&format!("go depth {depth}")).await
    }

    /// Swallow output that belongs to an abandoned search.
    fn skip_stale(&mut self, line: &EngineLine) -> bool {
        if self.owed_bestmoves == 0 {
            return false;
        }
        if matches!(line, EngineLine::BestMove(_)) {
            self.owed_bestmoves -= 1;
        }
        true
    }

    /// Stop the running search and read up to its `bestmove`, folding the
    /// final output into `state`.
    async fn halt(&mut self, state: &mut SearchState) {
        if let Err(e) = self.channel.send("stop").await {
            warn!(error = %e, "Failed to stop search");
            return;
        }

        let grace = self.settings.stop_grace;
        let drained = tokio::time::timeout(grace, self.drain(state)).await;
        if !matches!(drained, Ok(true)) {
            // The engine still owes us a bestmove for this search.
            self.owed_bestmoves += 1;
        }
    }

    async fn drain(&mut self, state: &mut SearchState) -> bool {
        loop {
            let line = match self.channel.recv().await {
                Ok(Some(line)) => line,
                _ => return false,
            };
            let parsed = parse_line(&line);
            if self.skip_stale(&parsed) {
                continue;
            }
            match parsed {
                EngineLine::Info(info) => state.apply(&info),
                EngineLine::BestMove(best) => {
                    state.finish(best);
                    return true;
                }
                EngineLine::Other => {}
            }
        }
    }
}
