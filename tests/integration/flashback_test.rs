//! Playback state machine, epochs and end-of-session detection

use flashback::engine::{EngineEvent, SeekOutcome};
use flashback::navigation::Direction;
use flashback::playback::{EndSignal, ReplayEvent, ReplayEventKind, ReplayPhase};
use flashback::session::SessionId;
use flashback::{FlashbackError, PlaybackState};

use crate::helpers::{approx, Harness, ReplayCall};

/// Ten seconds captured, capture stopped.
fn stopped_with_ten_seconds() -> Harness {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(10, 1.0);
    h.stop_capture();
    h.engine.take_events();
    h
}

/// Two five-second sessions, capture stopped.
fn stopped_with_two_sessions() -> Harness {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(5, 1.0);
    h.stop_capture();
    h.engine.toggle();
    h.feed(5, 1.0);
    h.stop_capture();
    h.engine.take_events();
    h
}

fn finished_signals(events: &[EngineEvent]) -> Vec<EndSignal> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::ReplayFinished { signal, .. } => Some(*signal),
            _ => None,
        })
        .collect()
}

// === Seeking ===

#[test]
fn seek_from_live_waits_for_the_recorder() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(10, 1.0);

    let outcome = h.engine.seek_to(5.0).unwrap();
    assert!(matches!(outcome, SeekOutcome::Pending { .. }));
    assert_eq!(h.engine.state(), PlaybackState::Transitioning);
    assert_eq!(h.capture.borrow().stops, 1);
    assert!(h.loads().is_empty());
    assert!(approx(h.engine.current_absolute_time(), 5.0));

    h.engine.notify_recorder_stopped();
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    let epoch = h.engine.epoch();
    assert_eq!(
        h.loads(),
        vec![ReplayCall::Load {
            epoch,
            session: SessionId(1),
            bytes: 1000,
            lead_in: 0.0,
        }]
    );
}

#[test]
fn metadata_seeks_to_offset_and_plays() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    h.clear_calls();

    h.metadata(10.0);
    let epoch = h.engine.epoch();
    assert_eq!(
        *h.replay.borrow(),
        vec![ReplayCall::Seek(epoch, 5.0), ReplayCall::Play(epoch)]
    );
    let replay = h.engine.replay().unwrap();
    assert_eq!(replay.phase, ReplayPhase::Playing);
    assert_eq!(replay.decoded_duration, Some(10.0));
}

#[test]
fn seek_with_empty_buffer_reports_no_data() {
    let mut h = Harness::live(30.0, 10.0);
    let err = h.engine.seek_to(3.0).unwrap_err();
    assert_eq!(err, FlashbackError::NoDataAvailable);
    assert!(h
        .engine
        .take_events()
        .contains(&EngineEvent::Notice("Nothing has been recorded yet".to_string())));
    assert_eq!(h.engine.state(), PlaybackState::Recording);
}

#[test]
fn seek_targets_are_clamped() {
    let mut h = stopped_with_ten_seconds();
    match h.engine.seek_to(-5.0).unwrap() {
        SeekOutcome::Started { offset, .. } => assert_eq!(offset, 0.0),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(h.engine.current_absolute_time(), 0.0);

    assert_eq!(h.engine.seek_to(1_000.0).unwrap(), SeekOutcome::Live);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
}

#[test]
fn every_seek_advances_the_epoch() {
    let mut h = stopped_with_ten_seconds();
    let before = h.engine.epoch();
    h.engine.seek_to(2.0).unwrap();
    let first = h.engine.epoch();
    h.engine.seek_to(4.0).unwrap();
    let second = h.engine.epoch();
    assert!(before < first && first < second);
}

// === Epochs ===

#[test]
fn stale_events_are_ignored() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(2.0).unwrap();
    let stale = h.engine.epoch();
    h.engine.seek_to(6.0).unwrap();

    h.engine
        .notify_replay_event(ReplayEvent::new(stale, ReplayEventKind::Ended, 8.0));
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    let replay = h.engine.replay().unwrap();
    assert!(!replay.ended_fired);
    assert!(finished_signals(&h.engine.take_events()).is_empty());
}

#[test]
fn superseded_timers_do_nothing() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(8.0).unwrap();
    h.engine.seek_to(0.0).unwrap();
    h.engine.take_events();

    // The first replay's timeout would have fired at 3s.
    h.advance(4.0);
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    assert!(finished_signals(&h.engine.take_events()).is_empty());
}

// === End-of-session detection ===

#[test]
fn native_end_without_next_session_goes_live() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    h.metadata(10.0);
    h.event(ReplayEventKind::Ended, 10.0);

    assert_eq!(finished_signals(&h.engine.take_events()), vec![EndSignal::NativeEnded]);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
    assert!(h.engine.replay().is_none());
    assert_eq!(h.capture.borrow().starts, 2);
}

#[test]
fn absolute_timeout_finishes_a_replay_that_never_loads() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();

    // Five visible seconds left plus one second of margin.
    h.advance(5.5);
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    h.advance(1.0);
    assert_eq!(finished_signals(&h.engine.take_events()), vec![EndSignal::Timeout]);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
}

#[test]
fn stalled_playback_is_finished_by_the_watchdog() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    h.metadata(10.0);

    h.advance(2.0);
    assert_eq!(finished_signals(&h.engine.take_events()), vec![EndSignal::Stalled]);
}

#[test]
fn progressing_playback_is_not_stalled() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(2.0).unwrap();
    h.metadata(10.0);

    let mut position = 2.0;
    for _ in 0..6 {
        h.clock.advance(0.5);
        position += 0.5;
        h.event(ReplayEventKind::TimeUpdate, position);
        h.engine.tick();
    }
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    assert!(approx(h.engine.current_absolute_time(), 5.0));
    assert!(finished_signals(&h.engine.take_events()).is_empty());
}

#[test]
fn near_end_guard_uses_the_shorter_decoded_duration() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    h.metadata(8.0);

    h.event(ReplayEventKind::TimeUpdate, 7.5);
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    h.event(ReplayEventKind::TimeUpdate, 7.9);
    assert_eq!(finished_signals(&h.engine.take_events()), vec![EndSignal::NearEnd]);
}

#[test]
fn a_session_finishes_exactly_once() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    h.metadata(10.0);
    let epoch = h.engine.epoch();

    h.event(ReplayEventKind::TimeUpdate, 9.9);
    h.engine
        .notify_replay_event(ReplayEvent::new(epoch, ReplayEventKind::Ended, 10.0));
    h.advance(10.0);

    assert_eq!(finished_signals(&h.engine.take_events()), vec![EndSignal::NearEnd]);
}

#[test]
fn replay_error_skips_the_session() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    h.event(ReplayEventKind::Error("decode error".to_string()), 0.0);

    assert_eq!(finished_signals(&h.engine.take_events()), vec![EndSignal::Failed]);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
}

#[test]
fn finished_session_hands_off_to_the_next_one() {
    let mut h = stopped_with_two_sessions();
    h.engine.seek_to(2.0).unwrap();
    h.metadata(5.0);
    h.event(ReplayEventKind::Ended, 5.0);

    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    let loads = h.loads();
    assert_eq!(loads.len(), 2);
    assert!(matches!(
        loads[1],
        ReplayCall::Load {
            session: SessionId(2),
            ..
        }
    ));
    assert!(approx(h.engine.current_absolute_time(), 5.0));

    h.metadata(5.0);
    h.event(ReplayEventKind::Ended, 5.0);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
}

// === User controls ===

#[test]
fn toggle_pauses_and_resumes_replay() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    h.metadata(10.0);
    let epoch = h.engine.epoch();
    h.clear_calls();

    assert_eq!(h.engine.toggle(), PlaybackState::FlashbackPaused);
    assert_eq!(h.engine.toggle(), PlaybackState::Flashback);
    assert_eq!(
        *h.replay.borrow(),
        vec![ReplayCall::Pause(epoch), ReplayCall::Play(epoch)]
    );
}

#[test]
fn paused_replay_does_not_time_out() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    h.metadata(10.0);
    h.engine.toggle();

    h.advance(30.0);
    assert_eq!(h.engine.state(), PlaybackState::FlashbackPaused);
}

#[test]
fn resuming_before_metadata_keeps_the_timeout() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    assert_eq!(h.engine.toggle(), PlaybackState::FlashbackPaused);
    assert_eq!(h.engine.toggle(), PlaybackState::Flashback);
    assert!(h.engine.next_timer_due().is_some());

    // Metadata never arrives.
    h.advance(100.0);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
    assert_eq!(
        finished_signals(&h.engine.take_events()),
        vec![EndSignal::Timeout]
    );
}

#[test]
fn escape_returns_to_live() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(5.0).unwrap();
    assert_eq!(h.engine.escape(), PlaybackState::Recording);
    assert!(h.replay.borrow().contains(&ReplayCall::Unload));
    assert_eq!(h.engine.escape(), PlaybackState::Recording);
}

#[test]
fn toggle_while_transitioning_is_ignored() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(5, 1.0);
    h.engine.seek_to(1.0).unwrap();
    assert_eq!(h.engine.toggle(), PlaybackState::Transitioning);
}

#[test]
fn step_forward_is_ignored_while_live() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(5, 1.0);
    assert_eq!(h.engine.step_forward().unwrap(), SeekOutcome::Ignored);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
}

#[test]
fn step_forward_past_the_end_goes_live() {
    let mut h = stopped_with_ten_seconds();
    h.engine.seek_to(9.5).unwrap();
    assert_eq!(h.engine.step_forward().unwrap(), SeekOutcome::Live);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
}

// === Recorder lifecycle ===

#[test]
fn recorder_stop_timeout_resumes_the_pending_seek() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(10, 1.0);
    h.engine.seek_to(4.0).unwrap();

    h.advance(2.0);
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    assert_eq!(h.loads().len(), 1);

    // The late callback is absorbed.
    h.engine.notify_recorder_stopped();
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
}

#[test]
fn seek_before_stop_is_confirmed_waits_for_the_recorder() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(10, 1.0);
    assert_eq!(h.engine.toggle(), PlaybackState::RecordingStopped);

    let outcome = h.engine.seek_to(4.0).unwrap();
    assert!(matches!(outcome, SeekOutcome::Pending { .. }));
    assert_eq!(h.engine.state(), PlaybackState::Transitioning);
    assert!(h.loads().is_empty());
    assert_eq!(h.engine.sessions().active(), Some(SessionId(1)));

    h.engine.notify_recorder_stopped();
    assert_eq!(h.engine.state(), PlaybackState::Flashback);
    assert_eq!(h.loads().len(), 1);
    assert_eq!(h.engine.sessions().active(), None);
}

#[test]
fn recorder_failure_after_a_forced_stop_is_reported() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(3, 1.0);
    h.engine.toggle();
    h.advance(2.5);

    assert_eq!(h.engine.toggle(), PlaybackState::Recording);
    h.feed(3, 1.0);
    h.engine.take_events();
    h.engine.notify_recorder_stopped();

    assert_eq!(h.engine.state(), PlaybackState::RecordingStopped);
    assert_eq!(h.engine.sessions().active(), None);
    assert!(h
        .engine
        .take_events()
        .contains(&EngineEvent::Notice("No capture source available".to_string())));
}

#[test]
fn capture_failure_leaves_recording_stopped() {
    let mut h = Harness::new(crate::helpers::config(30.0, 10.0));
    h.capture.borrow_mut().unavailable = true;

    assert_eq!(h.engine.start(), Err(FlashbackError::CaptureUnavailable));
    assert_eq!(h.engine.state(), PlaybackState::RecordingStopped);
    assert!(h
        .engine
        .take_events()
        .contains(&EngineEvent::Notice("No capture source available".to_string())));
}

#[test]
fn unexpected_recorder_stop_finalizes_the_session() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(3, 1.0);
    h.engine.notify_recorder_stopped();

    assert_eq!(h.engine.state(), PlaybackState::RecordingStopped);
    assert_eq!(h.engine.sessions().active(), None);
    assert_eq!(h.engine.sessions().len(), 1);
}

#[test]
fn flicker_session_is_discarded() {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(1, 0.2);
    h.stop_capture();

    assert!(h.engine.sessions().is_empty());
    assert!(h.engine.buffer().is_empty());
    assert!(h
        .engine
        .take_events()
        .contains(&EngineEvent::SessionDiscarded(SessionId(1))));
}

// === Markers ===

fn stopped_with_markers() -> Harness {
    let mut h = Harness::live(30.0, 10.0);
    h.feed(3, 1.0);
    h.engine.add_marker().unwrap();
    h.feed(3, 1.0);
    h.engine.add_marker().unwrap();
    h.feed(4, 1.0);
    h.stop_capture();
    h
}

fn offset(outcome: SeekOutcome) -> f64 {
    match outcome {
        SeekOutcome::Started { offset, .. } => offset,
        other => panic!("expected a started replay, got {:?}", other),
    }
}

#[test]
fn marker_navigation_walks_backward_and_forward() {
    let mut h = stopped_with_markers();
    assert_eq!(h.engine.markers().times(), vec![3.0, 6.0]);

    let back = h.engine.navigate_marker(Direction::Backward, 1).unwrap();
    assert!(approx(offset(back), 6.0));

    // Fewer markers than requested falls back to the window start.
    let back = h.engine.navigate_marker(Direction::Backward, 2).unwrap();
    assert!(approx(offset(back), 0.0));

    let forward = h.engine.navigate_marker(Direction::Forward, 1).unwrap();
    assert!(approx(offset(forward), 3.0));
    let forward = h.engine.navigate_marker(Direction::Forward, 1).unwrap();
    assert!(approx(offset(forward), 6.0));

    let forward = h.engine.navigate_marker(Direction::Forward, 1).unwrap();
    assert_eq!(forward, SeekOutcome::Live);
    assert_eq!(h.engine.state(), PlaybackState::Recording);
}

#[test]
fn rapid_marker_presses_skip_from_the_first_position() {
    let mut h = stopped_with_markers();
    assert!(approx(offset(h.engine.press_marker(Direction::Backward).unwrap()), 6.0));
    h.advance(0.2);
    assert!(approx(offset(h.engine.press_marker(Direction::Backward).unwrap()), 3.0));
}

#[test]
fn markers_outside_the_window_are_pruned() {
    let mut h = Harness::live(5.0, 0.0);
    h.feed(2, 1.0);
    h.engine.add_marker().unwrap();
    h.feed(10, 1.0);
    assert!(h.engine.markers().is_empty());
}

#[test]
fn marker_without_data_is_refused() {
    let mut h = Harness::live(30.0, 10.0);
    assert_eq!(h.engine.add_marker(), Err(FlashbackError::NoDataAvailable));
}
