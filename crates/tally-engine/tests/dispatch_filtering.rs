//! Integration test: event routing through a session.
//!
//! Handlers see exactly the events they declared interest in, in
//! registration order, and a `Discard` from any of them reaches the
//! transport loop without hiding the event from the others.

use proptest::prelude::*;
use tally_core::{EventAction, EventContext, EventKind, EventSet, HistoryId};
use tally_engine::ScoringSession;
use tally_observer::{DoseScoring, RegionMap};
use tally_test_utils::{HistoryStream, RecordingObserver};

fn arb_kinds() -> impl Strategy<Value = EventSet> {
    prop::collection::vec(prop::sample::select(EventKind::ALL.to_vec()), 0..8)
        .prop_map(|kinds| kinds.into_iter().collect())
}

fn recorder<'a>(s: &'a ScoringSession, name: &str) -> &'a RecordingObserver {
    s.handler::<RecordingObserver>(name).unwrap()
}

proptest! {
    #[test]
    fn handlers_only_see_declared_kinds(
        a in arb_kinds(),
        b in arb_kinds(),
        seed in any::<u64>(),
    ) {
        let mut s = ScoringSession::new();
        s.register(Box::new(RecordingObserver::new("a", a))).unwrap();
        s.register(Box::new(RecordingObserver::new("b", b))).unwrap();

        let mut fired = [0u64; EventKind::COUNT];
        for (case, events) in HistoryStream::new(seed).take(40) {
            s.notify_new_history(case);
            for e in events {
                fired[e.kind.index()] += 1;
                s.dispatch(e.kind, &e.ctx);
            }
        }

        for (name, kinds) in [("a", a), ("b", b)] {
            let rec = recorder(&s, name);
            prop_assert_eq!(rec.unexpected(), 0);
            for kind in EventKind::ALL {
                let expected = if kinds.contains(kind) { fired[kind.index()] } else { 0 };
                prop_assert_eq!(rec.calls(kind), expected, "{} {:?}", name, kind);
            }
            prop_assert_eq!(rec.histories().len(), 40);
        }
        for kind in EventKind::ALL {
            prop_assert_eq!(s.any_interest(kind), a.contains(kind) || b.contains(kind));
        }
    }
}

#[test]
fn routes_follow_registration_order() {
    let mut s = ScoringSession::new();
    for name in ["first", "second", "third"] {
        s.register(Box::new(RecordingObserver::new(name, EventSet::all())))
            .unwrap();
    }
    assert_eq!(s.interested(EventKind::AfterCompton), &[0usize, 1, 2]);
}

#[test]
fn discard_from_one_handler_still_reaches_the_rest() {
    let kinds = EventSet::empty().with(EventKind::BeforeTransport);
    let mut s = ScoringSession::new();
    s.register(Box::new(
        RecordingObserver::new("veto", kinds).with_action(EventAction::Discard),
    ))
    .unwrap();
    s.register(Box::new(RecordingObserver::new("after", kinds)))
        .unwrap();

    s.next_history();
    let action = s.dispatch(EventKind::BeforeTransport, &EventContext::in_region(0));
    assert_eq!(action, EventAction::Discard);
    assert_eq!(recorder(&s, "after").calls(EventKind::BeforeTransport), 1);

    let action = s.dispatch(EventKind::AfterTransport, &EventContext::in_region(0));
    assert_eq!(action, EventAction::Continue);
}

#[test]
fn handler_registered_mid_run_joins_routing() {
    let kinds = EventSet::empty().with(EventKind::Auger);
    let mut s = ScoringSession::new();
    s.register(Box::new(RecordingObserver::new("early", kinds)))
        .unwrap();
    s.next_history();
    s.dispatch(EventKind::Auger, &EventContext::default());

    s.register(Box::new(RecordingObserver::new("late", kinds)))
        .unwrap();
    s.next_history();
    s.dispatch(EventKind::Auger, &EventContext::default());

    assert_eq!(recorder(&s, "early").calls(EventKind::Auger), 2);
    assert_eq!(recorder(&s, "late").calls(EventKind::Auger), 1);
    assert_eq!(recorder(&s, "late").histories(), &[HistoryId(2)]);
}

#[test]
fn region_override_is_what_handlers_see() {
    let mut s = ScoringSession::new();
    let dose = DoseScoring::new("dose", RegionMap::identity(6), None).unwrap();
    s.register(Box::new(dose)).unwrap();
    for _ in 0..2 {
        s.next_history();
        let ctx = EventContext::in_region(2).with_edep(1.0);
        s.dispatch_in_region(EventKind::BeforeTransport, &ctx, 5);
    }
    let dose = s.handler::<DoseScoring>("dose").unwrap();
    assert_eq!(dose.region_dose(5).unwrap().mean, 1.0);
    assert_eq!(dose.region_dose(2).unwrap().mean, 0.0);
}
