//! Organ lifecycle integration tests
//!
//! Startup, listener registration, independent instances and shutdown.

use crate::helpers::*;
use aeolus::core::Error as CoreError;
use aeolus::prelude::*;

#[test]
fn test_load_complete_fires_once() {
    let mut organ = TestOrgan::new();
    assert!(organ.organ.is_initializing());

    organ.wait_loaded();
    assert!(!organ.organ.is_initializing());
    assert!(organ.organ.model().wavetables().is_some());

    organ.cycles(10);
    assert_eq!(organ.recorder.count(Notification::LoadComplete), 1);
    assert_eq!(organ.recorder.count(Notification::Retuned), 0);
}

#[test]
fn test_output_is_silent_before_load() {
    let mut organ = TestOrgan::new();
    organ.organ.activate_stop(0, 0).unwrap();
    organ.notes.note_on(0, 60, 100);

    let report = organ.cycle();
    if !report.load_completed {
        // The renderer has no tables until the first publish.
        assert_silence(organ.output(), SILENCE_THRESHOLD);
    }

    organ.wait_loaded();
    organ.cycle();
    assert_has_audio(organ.output(), AUDIBLE_RMS);
}

#[test]
fn test_topology_queries() {
    let organ = TestOrgan::new();
    let organ = &organ.organ;

    assert_eq!(organ.organ_name(), "Test organ");
    assert_eq!(organ.division_count(), 3);
    assert_eq!(organ.division_label(0), Some("Great"));
    assert_eq!(organ.division_label(3), None);
    assert_eq!(organ.stop_count(0), 3);
    assert_eq!(organ.stop_count(2), 1);
    assert_eq!(organ.stop_count(7), 0);
    assert_eq!(organ.stop_label(0, 2), Some("Mixture III"));
    assert_eq!(organ.stop_label(1, 5), None);
    assert!(!organ.stop_activated(9, 9));
    assert_eq!(organ.stop_phase(9, 9), None);
    assert_eq!(organ.max_ranks_per_stop(), 5);
    assert_eq!(organ.division_volume(4), None);
}

#[test]
fn test_invalid_definition_never_starts() {
    let empty = OrganDefinition::new("Empty");
    assert!(matches!(
        OrganContext::builder().definition(empty).build(),
        Err(CoreError::InvalidDefinition(_))
    ));

    let bad_route = test_definition().route(3, route(&[3]));
    assert!(matches!(
        OrganContext::builder().definition(bad_route).build(),
        Err(CoreError::InvalidDefinition(_))
    ));
}

#[test]
fn test_umbrella_error_wraps_core() {
    fn build(definition: OrganDefinition) -> aeolus::Result<OrganContext> {
        Ok(OrganContext::builder().definition(definition).build()?)
    }

    let err = build(OrganDefinition::new("Empty")).unwrap_err();
    assert!(matches!(err, aeolus::Error::Core(CoreError::InvalidDefinition(_))));
}

#[test]
fn test_instances_are_independent() {
    let mut first = TestOrgan::loaded();
    let mut second = TestOrgan::loaded();

    first.organ.activate_stop(0, 0).unwrap();
    first.cycle();
    second.cycle();

    assert!(first.organ.stop_activated(0, 0));
    assert!(!second.organ.stop_activated(0, 0));
}

#[test]
fn test_listener_replacement() {
    let mut organ = TestOrgan::loaded();
    let replacement = Recorder::default();
    organ.organ.set_updater(Some(replacement.listener()));

    organ.organ.activate_stop(1, 0).unwrap();
    organ.cycle();
    assert_eq!(replacement.events(), vec![Notification::StopsUpdated]);
    assert_eq!(organ.recorder.count(Notification::StopsUpdated), 0);

    organ.organ.set_updater(None);
    organ.organ.deactivate_stop(1, 0).unwrap();
    organ.cycles(10);
    assert_eq!(replacement.count(Notification::StopsUpdated), 1);
}

#[test]
fn test_shutdown_halts_audio_and_refuses_commands() {
    let mut organ = TestOrgan::loaded();
    organ.organ.activate_stop(0, 0).unwrap();
    organ.notes.note_on(0, 60, 100);
    organ.cycle();
    assert_has_audio(organ.output(), AUDIBLE_RMS);

    organ.organ.shutdown().unwrap();
    assert!(!organ.organ.is_shut_down());
    assert!(matches!(
        organ.organ.activate_stop(0, 1),
        Err(CoreError::ShutDown)
    ));
    assert!(matches!(
        organ.organ.set_midi_mapping(0, 3, true),
        Err(CoreError::ShutDown)
    ));

    let report = organ.cycle();
    assert!(report.halted);
    assert!(organ.organ.is_shut_down());
    assert_silence(organ.output(), SILENCE_THRESHOLD);

    organ.cycles(3);
    assert_silence(organ.output(), SILENCE_THRESHOLD);
}

#[test]
fn test_drop_joins_retune_worker() {
    let mut organ = TestOrgan::new();
    organ.organ.retune(2, 430.0).unwrap();
    drop(organ);
}
