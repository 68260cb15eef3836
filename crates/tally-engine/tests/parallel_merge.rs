//! Integration test: merging the checkpoints of parallel jobs.
//!
//! A run split into independent jobs and merged with
//! `combine_results` must carry the same sums and history count as the
//! same histories scored by a single session, whatever the split.

use proptest::prelude::*;
use tally_engine::{ScoringSession, SessionConfig, SessionError, SessionPhase};
use tally_observer::{DoseScoring, ObserverDecl, ObserverFactory};
use tally_test_utils::{HistoryStream, SyntheticEvent};

fn config() -> SessionConfig {
    SessionConfig::new().with_observer(
        ObserverDecl::new("dose", "dose_scoring")
            .with("region_count", 4i64)
            .with("media", 2i64),
    )
}

fn session() -> ScoringSession {
    ScoringSession::from_config(&config(), &ObserverFactory::with_builtins()).unwrap()
}

fn score(histories: &[Vec<SyntheticEvent>]) -> ScoringSession {
    let mut s = session();
    for events in histories {
        s.next_history();
        for e in events {
            s.dispatch(e.kind, &e.ctx);
        }
    }
    s
}

fn stored(s: &ScoringSession) -> Vec<u8> {
    let mut buf = Vec::new();
    s.store(&mut buf).unwrap();
    buf
}

/// Split `histories` at the sorted cut points into contiguous jobs.
fn split(histories: &[Vec<SyntheticEvent>], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut bounds: Vec<usize> = cuts.iter().map(|&c| c % (histories.len() + 1)).collect();
    bounds.sort_unstable();
    bounds.push(histories.len());
    let mut start = 0;
    let mut jobs = Vec::new();
    for end in bounds {
        jobs.push(stored(&score(&histories[start..end])));
        start = end;
    }
    jobs
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn dose_totals(s: &ScoringSession) -> Vec<(f64, f64)> {
    let dose = s.handler::<DoseScoring>("dose").unwrap();
    let mut out = Vec::new();
    for array in [dose.region_array().unwrap(), dose.medium_array().unwrap()] {
        out.extend(array.cells().iter().map(|cell| cell.completed_totals()));
    }
    out
}

fn same_totals(a: &ScoringSession, b: &ScoringSession) -> Result<(), TestCaseError> {
    prop_assert_eq!(a.current_case(), b.current_case());
    for ((s, s2), (t, t2)) in dose_totals(a).into_iter().zip(dose_totals(b)) {
        prop_assert!(close(s, t), "sum {} vs {}", s, t);
        prop_assert!(close(s2, t2), "sum2 {} vs {}", s2, t2);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn merged_jobs_equal_one_serial_run(
        seed in any::<u64>(),
        n in 1usize..120,
        cuts in prop::collection::vec(any::<usize>(), 0..5),
    ) {
        let histories: Vec<_> = HistoryStream::new(seed).take(n).map(|(_, e)| e).collect();
        let serial = score(&histories);

        let jobs = split(&histories, &cuts);
        let mut merged = session();
        let total = merged.combine_results(jobs.iter().map(|j| j.as_slice())).unwrap();

        prop_assert_eq!(total, n as u64);
        prop_assert_eq!(merged.phase(), SessionPhase::Merging);
        same_totals(&merged, &serial)?;
    }

    #[test]
    fn merge_order_is_irrelevant(seed in any::<u64>(), cuts in prop::collection::vec(any::<usize>(), 1..5)) {
        let histories: Vec<_> = HistoryStream::new(seed).take(60).map(|(_, e)| e).collect();
        let jobs = split(&histories, &cuts);

        let mut forward = session();
        forward.combine_results(jobs.iter().map(|j| j.as_slice())).unwrap();
        let mut backward = session();
        backward.combine_results(jobs.iter().rev().map(|j| j.as_slice())).unwrap();
        same_totals(&forward, &backward)?;
    }
}

#[test]
fn merged_result_matches_serial_estimate() {
    let histories: Vec<_> = HistoryStream::new(9).take(400).map(|(_, e)| e).collect();
    let serial = score(&histories);
    let jobs = split(&histories, &[100, 250, 330]);
    let mut merged = session();
    merged
        .combine_results(jobs.iter().map(|j| j.as_slice()))
        .unwrap();

    let a = merged.handler::<DoseScoring>("dose").unwrap();
    let b = serial.handler::<DoseScoring>("dose").unwrap();
    for region in 0..4 {
        let (x, y) = (
            a.region_dose(region).unwrap(),
            b.region_dose(region).unwrap(),
        );
        assert!(close(x.mean, y.mean));
        assert!(close(x.std_error, y.std_error));
    }
}

#[test]
fn combine_resets_previous_state() {
    let histories: Vec<_> = HistoryStream::new(3).take(30).map(|(_, e)| e).collect();
    let job = stored(&score(&histories));

    let mut s = score(&histories);
    let total = s.combine_results([job.as_slice()]).unwrap();
    assert_eq!(total, 30);
    assert_eq!(s.current_case().0, 30);
}

#[test]
fn failed_merge_reports_the_error() {
    let histories: Vec<_> = HistoryStream::new(4).take(10).map(|(_, e)| e).collect();
    let good = stored(&score(&histories));
    let bad = b"TALY\x01 not a session".to_vec();

    let mut s = session();
    let err = s
        .combine_results([good.as_slice(), bad.as_slice()])
        .unwrap_err();
    assert!(matches!(err, SessionError::Checkpoint(_)));
}
