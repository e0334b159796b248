//! End-to-end buffer, session, marker and step scenarios

use flashback::buffer::FragmentInput;
use flashback::engine::SeekOutcome;
use flashback::session::SessionId;
use flashback::{FlashbackError, PlaybackState};

use crate::helpers::{approx, Harness};

#[test]
fn fifteen_seconds_fit_without_eviction() {
    let mut h = Harness::live(10.0, 10.0);
    h.feed(15, 1.0);

    assert!(approx(h.engine.buffered_duration(), 15.0));
    assert_eq!(h.engine.buffer().len(), 15);
    assert!(approx(h.engine.visible_window().duration, 10.0));

    let session = &h.engine.sessions().sessions()[0];
    assert!(approx(session.visible_duration, 10.0));
    assert!(approx(session.pre_roll_duration, 5.0));
}

#[test]
fn twenty_five_seconds_evict_down_to_retention_limit() {
    let mut h = Harness::live(10.0, 10.0);
    h.feed(25, 1.0);

    assert!(approx(h.engine.buffered_duration(), 20.0));
    assert_eq!(h.engine.buffer().len(), 20);

    let lifetime = h.engine.lifetime_duration();
    assert!(approx(lifetime, 25.0));
    let session = &h.engine.sessions().sessions()[0];
    assert!(approx(session.visible_start_abs, lifetime - 10.0));
    assert!(session.header.is_some(), "evicted header must be kept");
}

#[test]
fn late_fragment_joins_the_finalized_session() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(5, 1.0);
    h.stop_capture();
    assert_eq!(h.engine.state(), PlaybackState::RecordingStopped);

    // Flushed by the encoder after the stop was reported.
    h.engine.ingest(FragmentInput::new(vec![7; 100], 0.3));

    h.engine.toggle();
    assert_eq!(h.engine.state(), PlaybackState::Recording);
    h.feed(5, 1.0);

    let sessions = h.engine.sessions().sessions();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, SessionId(1));
    assert_eq!(sessions[0].fragments.len(), 6);
    assert!(approx(sessions[0].visible_duration, 5.3));
    assert!(approx(sessions[1].visible_duration, 5.0));
    assert!(approx(sessions[1].visible_start_abs, 5.3));
}

#[test]
fn marker_within_epsilon_is_rejected() {
    let mut h = Harness::live(30.0, 10.0);
    h.engine.ingest(FragmentInput::new(vec![7; 100], 3.2));
    h.engine.add_marker().unwrap();

    h.engine.ingest(FragmentInput::new(vec![7; 100], 0.02));
    let err = h.engine.add_marker().unwrap_err();
    assert!(matches!(err, FlashbackError::DuplicateMarker { .. }));
    assert!(!err.is_user_visible());
    assert_eq!(h.engine.markers().len(), 1);
    assert!(approx(h.engine.markers().times()[0], 3.2));
}

fn started_offset(outcome: SeekOutcome) -> f64 {
    match outcome {
        SeekOutcome::Started { offset, .. } => offset,
        other => panic!("expected a started replay, got {:?}", other),
    }
}

#[test]
fn rapid_back_presses_double_from_the_first_press() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(30, 1.0);
    h.stop_capture();

    let mut offsets = Vec::new();
    for _ in 0..4 {
        offsets.push(started_offset(h.engine.step_back().unwrap()));
        h.advance(0.3);
    }
    // Cumulative distance from 30s: 1, 2, 4, 8.
    assert_eq!(offsets, vec![29.0, 28.0, 26.0, 22.0]);
}

#[test]
fn pause_between_presses_starts_a_new_burst() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(30, 1.0);
    h.stop_capture();

    started_offset(h.engine.step_back().unwrap());
    h.advance(0.2);
    assert!(approx(started_offset(h.engine.step_back().unwrap()), 28.0));

    h.advance(0.6);
    assert!(approx(started_offset(h.engine.step_back().unwrap()), 27.0));
}
