//! Property-based tests for retention, session bounds and seeking.

use proptest::prelude::*;

use flashback::buffer::FragmentInput;
use flashback::engine::{FlashbackEngine, SeekOutcome};
use flashback::PlaybackState;

use crate::helpers::{config, Harness};

const EPSILON: f64 = 1e-6;

// =============================================================================
// Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Ingest(f64),
    Toggle,
    SetMaxDuration(f64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => (0.1f64..3.0).prop_map(Op::Ingest),
        1 => Just(Op::Toggle),
        1 => (1.0f64..30.0).prop_map(Op::SetMaxDuration),
    ]
}

fn arb_retention() -> impl Strategy<Value = (f64, f64)> {
    (1.0f64..20.0, 0.0f64..10.0)
}

fn apply(h: &mut Harness, op: &Op) {
    match op {
        Op::Ingest(duration) => {
            h.engine.ingest(FragmentInput::new(vec![3; 64], *duration));
        }
        Op::Toggle => {
            let was_recording = h.engine.state() == PlaybackState::Recording;
            h.engine.toggle();
            if was_recording {
                h.engine.notify_recorder_stopped();
            }
        }
        Op::SetMaxDuration(seconds) => h.engine.set_max_duration(*seconds),
    }
}

fn run(retention: (f64, f64), ops: &[Op]) -> Harness {
    let mut h = Harness::new(config(retention.0, retention.1));
    h.engine.start().unwrap();
    for op in ops {
        apply(&mut h, op);
    }
    h
}

fn visible_sum(engine: &FlashbackEngine, session: flashback::session::SessionId) -> f64 {
    engine
        .buffer()
        .iter()
        .filter(|f| f.session_id == session && !f.is_pre_roll)
        .map(|f| f.duration)
        .sum()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn buffer_stays_within_retention_limit(
        retention in arb_retention(),
        ops in prop::collection::vec(arb_op(), 1..80),
    ) {
        let h = run(retention, &ops);
        let limit = h.engine.config().buffer.retention_limit();
        let buffered = h.engine.buffered_duration();
        prop_assert!(buffered <= limit + EPSILON);

        let summed: f64 = h.engine.buffer().iter().map(|f| f.duration).sum();
        prop_assert!((summed - buffered).abs() < EPSILON);
    }

    #[test]
    fn visible_duration_matches_visible_fragments(
        retention in arb_retention(),
        ops in prop::collection::vec(arb_op(), 1..80),
    ) {
        let h = run(retention, &ops);
        for session in h.engine.sessions().iter() {
            let expected = visible_sum(&h.engine, session.id);
            prop_assert!((session.visible_duration - expected).abs() < EPSILON);
            prop_assert!(session.visible_duration > 0.0 || session.is_active());
        }
    }

    #[test]
    fn header_survives_eviction(
        retention in arb_retention(),
        ops in prop::collection::vec(arb_op(), 1..80),
    ) {
        let h = run(retention, &ops);
        for session in h.engine.sessions().iter() {
            let Some(&first) = session.fragments.first() else {
                continue;
            };
            let starts_with_header = h
                .engine
                .buffer()
                .get(first)
                .is_some_and(|f| f.is_header);
            prop_assert!(starts_with_header || session.header.is_some());
        }
    }

    #[test]
    fn resettling_is_idempotent(
        retention in arb_retention(),
        ops in prop::collection::vec(arb_op(), 1..60),
    ) {
        let mut h = run(retention, &ops);
        let window = h.engine.visible_window();
        let summaries = h.engine.list_sessions_for_display();

        let margin = h.engine.config().buffer.buffer_margin;
        h.engine.set_buffer_margin(margin);

        prop_assert_eq!(h.engine.visible_window(), window);
        prop_assert_eq!(h.engine.list_sessions_for_display(), summaries);
    }

    #[test]
    fn seek_targets_clamp_to_lifetime(
        count in 1usize..30,
        target in -1_000.0f64..1_000.0,
    ) {
        let mut h = Harness::live(30.0, 10.0);
        h.feed(count, 1.0);
        h.stop_capture();

        let lifetime = h.engine.lifetime_duration();
        let outcome = h.engine.seek_to(target).unwrap();
        let now = h.engine.current_absolute_time();
        prop_assert!((0.0..=lifetime).contains(&now));

        if let SeekOutcome::Started { offset, .. } = outcome {
            prop_assert!(offset >= 0.0 && offset <= lifetime);
            prop_assert!((now - target.clamp(0.0, lifetime)).abs() < EPSILON);
        } else {
            prop_assert_eq!(outcome, SeekOutcome::Live);
            prop_assert!(target >= lifetime);
        }
    }
}
