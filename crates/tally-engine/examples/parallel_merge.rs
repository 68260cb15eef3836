//! Tally parallel run: score independent jobs on threads, checkpoint
//! each, and merge the checkpoints into one result.
//!
//! Demonstrates:
//!   1. Declaring observers in a SessionConfig
//!   2. Driving a session from a (synthetic) transport loop
//!   3. Periodic checkpoints
//!   4. Merging job checkpoints with combine_results
//!   5. Reporting through the tracing sink
//!
//! Run with:
//!   RUST_LOG=info cargo run --example parallel_merge

use std::thread;

use tally_core::TracingSink;
use tally_engine::{ScoringSession, SessionConfig, SessionError};
use tally_observer::{ObserverDecl, ObserverFactory};
use tally_test_utils::HistoryStream;
use tracing_subscriber::EnvFilter;

const JOBS: u64 = 4;
const HISTORIES_PER_JOB: usize = 25_000;

fn config() -> SessionConfig {
    SessionConfig::new()
        .with_observer(
            ObserverDecl::new("dose", "dose_scoring")
                .with("regions", vec![0i64, 1, 2, 3])
                .with("media", 2i64)
                .with("relative_error", true),
        )
        .with_observer(
            ObserverDecl::new("rr", "range_rejection")
                .with("e_max", 0.25)
                .with("regions", vec![2i64, 3]),
        )
        .with_checkpoint_interval(10_000)
}

/// One job: its own session and its own random stream.
fn run_job(job: u64) -> Result<Vec<u8>, SessionError> {
    let mut session = ScoringSession::from_config(&config(), &ObserverFactory::with_builtins())?;
    let mut checkpoint = Vec::new();
    for (_, events) in HistoryStream::new(job).take(HISTORIES_PER_JOB) {
        session.next_history();
        for e in events {
            // A discarded particle has no further events in a real
            // transport loop; the synthetic stream ignores it.
            let _ = session.dispatch(e.kind, &e.ctx);
        }
        if session.checkpoint_due() {
            checkpoint.clear();
            session.store(&mut checkpoint)?;
        }
    }
    checkpoint.clear();
    session.store(&mut checkpoint)?;
    Ok(checkpoint)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let results: Vec<Result<Vec<u8>, SessionError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..JOBS)
            .map(|job| scope.spawn(move || run_job(job)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| panic!("job thread panicked")))
            .collect()
    });
    let checkpoints = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    let mut merged = ScoringSession::from_config(&config(), &ObserverFactory::with_builtins())?;
    let total = merged.combine_results(checkpoints.iter().map(|c| c.as_slice()))?;
    tracing::info!(jobs = JOBS, histories = total, "all jobs merged");

    merged.report_results(&mut TracingSink);
    Ok(())
}
