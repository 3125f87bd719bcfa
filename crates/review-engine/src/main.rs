//! Game review CLI
//!
//! Reviews one PGN game with a local Stockfish and prints the result as
//! JSON, or as an annotated move list with `--summary`.

use std::io::Read;

use anyhow::Context;
use review_engine::{
    format_evaluation, GameReview, GameReviewer, OracleHandle, OracleSettings, ReviewConfig,
    ReviewSettings, ReviewStatus, StockfishProcess,
};
use tracing::{info, warn};

const USAGE: &str = "usage: review-game [--depth <n>] [--summary] <game.pgn | ->";

struct Args {
    depth: Option<u32>,
    summary: bool,
    path: String,
}

/// Parse `--depth <n>`, `--summary` and the PGN path from CLI args
fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut depth = None;
    let mut summary = false;
    let mut path = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--depth" => {
                let value = args.get(i + 1).context(USAGE)?;
                let parsed = value
                    .parse::<u32>()
                    .with_context(|| format!("invalid depth: {value}"))?;
                depth = Some(parsed);
                i += 1;
            }
            "--summary" => summary = true,
            other => path = Some(other.to_string()),
        }
        i += 1;
    }

    Ok(Args {
        depth,
        summary,
        path: path.context(USAGE)?,
    })
}

fn read_pgn(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut pgn = String::new();
        std::io::stdin().read_to_string(&mut pgn)?;
        return Ok(pgn);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

fn print_summary(review: &GameReview) {
    for reviewed in &review.moves {
        let played = &reviewed.played;
        let number = match played.side {
            chess_core::Side::White => format!("{}.", played.move_number),
            chess_core::Side::Black => format!("{}...", played.move_number),
        };
        let (label, symbol) = reviewed
            .classification
            .map_or(("Unreviewed", ""), |c| (c.label(), c.symbol()));
        println!(
            "{number:<6} {:<8} {symbol:<3} {:<11} {:>6}",
            played.san,
            label,
            format_evaluation(reviewed.evaluation, reviewed.mate)
        );
    }
    println!(
        "Accuracy: white {}%, black {}%",
        review.white_accuracy, review.black_accuracy
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args = parse_args()?;
    let mut config = ReviewConfig::from_env()?;
    if let Some(depth) = args.depth {
        config.analysis_depth = depth;
        config.validate()?;
    }
    info!(
        stockfish_path = %config.stockfish_path,
        depth = config.analysis_depth,
        "Review config loaded"
    );

    let pgn = read_pgn(&args.path)?;

    let oracle = match StockfishProcess::spawn(&config).await {
        Ok(engine) => OracleHandle::spawn(engine, OracleSettings::from(&config)),
        Err(e) => {
            warn!(error = %e, "Stockfish unavailable, evaluations will be neutral");
            OracleHandle::unavailable()
        }
    };

    let reviewer = GameReviewer::new(oracle, ReviewSettings::from(&config));
    let mut status = reviewer.subscribe();
    let progress = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            if let ReviewStatus::Running { progress } = &*status.borrow_and_update() {
                info!(progress, "Reviewing");
            }
        }
    });

    let review = reviewer.review_pgn(&pgn).await?;
    progress.abort();

    if review.moves.is_empty() {
        warn!("No moves found in the PGN");
    }

    if args.summary {
        print_summary(&review);
    } else {
        println!("{}", serde_json::to_string_pretty(&review)?);
    }

    Ok(())
}
