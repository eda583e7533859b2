//! Stop lifecycle integration tests
//!
//! Activation requests travel over the command channel, advance on the audio
//! side, and come back as coalesced `StopsUpdated` notifications.

use crate::helpers::*;
use aeolus::prelude::*;
use approx::assert_abs_diff_eq;
use proptest::prelude::*;

/// Two divisions with three and two stops.
fn two_division_organ() -> TestOrgan {
    let definition = OrganDefinition::new("Two manuals")
        .division(
            DivisionDefinition::new("Great")
                .stop(StopDefinition::new("Principal 8"))
                .stop(StopDefinition::new("Octave 4"))
                .stop(StopDefinition::new("Fifteenth 2")),
        )
        .division(
            DivisionDefinition::new("Swell")
                .stop(StopDefinition::new("Gedackt 8"))
                .stop(StopDefinition::new("Oboe 8")),
        );
    let mut organ = TestOrgan::with_definition(definition);
    organ.wait_loaded();
    organ.recorder.clear();
    organ
}

/// Cycles needed to cover `seconds` of ramp time.
fn cycles_for(seconds: f32) -> usize {
    (seconds as f64 * TEST_SAMPLE_RATE / TEST_BUFFER_SIZE as f64).ceil() as usize + 1
}

#[test]
fn test_activate_then_deactivate_end_to_end() {
    let mut organ = two_division_organ();
    let config = OrganConfig::default();

    organ.organ.activate_stop(0, 1).unwrap();
    assert!(!organ.organ.stop_activated(0, 1), "confirmed before the audio thread ran");

    organ.cycle();
    assert!(organ.organ.stop_activated(0, 1));
    assert_eq!(organ.recorder.count(Notification::StopsUpdated), 1);

    organ.organ.deactivate_stop(0, 1).unwrap();
    organ.cycle();
    assert!(
        organ.organ.stop_activated(0, 1),
        "a releasing stop still counts as on"
    );
    assert_eq!(organ.organ.stop_phase(0, 1), Some(StopPhase::Releasing));

    organ.cycles(cycles_for(config.release_time));
    assert!(!organ.organ.stop_activated(0, 1));
    assert_eq!(organ.organ.stop_phase(0, 1), Some(StopPhase::Inactive));
    assert_eq!(organ.recorder.count(Notification::StopsUpdated), 2);
}

#[test]
fn test_simultaneous_changes_coalesce() {
    let mut organ = two_division_organ();

    organ.organ.activate_stop(0, 0).unwrap();
    organ.organ.activate_stop(0, 2).unwrap();
    organ.organ.activate_stop(1, 1).unwrap();
    organ.cycle();

    assert!(organ.organ.stop_activated(0, 0));
    assert!(organ.organ.stop_activated(0, 2));
    assert!(organ.organ.stop_activated(1, 1));
    assert!(!organ.organ.stop_activated(1, 0));
    assert_eq!(organ.recorder.events(), vec![Notification::StopsUpdated]);
}

#[test]
fn test_repeated_activation_is_idempotent() {
    let mut organ = two_division_organ();

    organ.organ.activate_stop(1, 0).unwrap();
    organ.cycle();
    organ.organ.activate_stop(1, 0).unwrap();
    organ.cycles(3);

    assert!(organ.organ.stop_activated(1, 0));
    assert_eq!(organ.recorder.count(Notification::StopsUpdated), 1);
}

#[test]
fn test_quiet_cycles_send_nothing() {
    let mut organ = two_division_organ();
    organ.cycles(10);
    assert!(organ.recorder.events().is_empty());
}

#[test]
fn test_registered_stop_sounds_through_routed_keys() {
    let mut organ = TestOrgan::loaded();

    organ.notes.note_on(0, 60, 100);
    organ.cycle();
    assert_silence(organ.output(), SILENCE_THRESHOLD);

    organ.organ.activate_stop(0, 0).unwrap();
    organ.cycles(2);
    assert_has_audio(organ.output(), AUDIBLE_RMS);

    organ.notes.note_off(0, 60);
    organ.cycle();
    assert_silence(organ.output(), SILENCE_THRESHOLD);
}

#[test]
fn test_division_volume_reaches_audio_thread() {
    let mut organ = TestOrgan::loaded();
    organ.organ.set_division_volume(1, 0.25).unwrap();
    assert_eq!(organ.organ.division_volume(1), Some(1.0));

    organ.cycle();
    let volume = organ.organ.division_volume(1).unwrap();
    assert_abs_diff_eq!(volume, 0.25, epsilon = FLOAT_EPSILON);
    assert_eq!(organ.audio.dispatcher().voices()[1].gain(), volume);
    assert!(organ.recorder.count(Notification::StopsUpdated) == 0);
}

fn forward_steps(from: StopPhase, to: StopPhase) -> u8 {
    (to.to_u8() + 4 - from.to_u8()) % 4
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Observed once per cycle, a stop only ever moves forward through its
    /// lifecycle and always settles on the last request.
    #[test]
    fn test_phase_moves_forward_and_settles(
        script in prop::collection::vec((any::<bool>(), 0usize..6), 1..12)
    ) {
        let config = OrganConfig::default()
            .with_sample_rate(TEST_SAMPLE_RATE)
            .with_engage_time(0.02)
            .with_release_time(0.03);
        let mut organ = TestOrgan::with_config(test_definition(), config);

        let mut previous = StopPhase::Inactive;
        let mut last_intent = false;
        for (activate, gap) in script {
            if activate {
                organ.organ.activate_stop(0, 0).unwrap();
            } else {
                organ.organ.deactivate_stop(0, 0).unwrap();
            }
            last_intent = activate;

            for _ in 0..=gap {
                organ.cycle();
                let phase = organ.organ.stop_phase(0, 0).unwrap();
                prop_assert!(
                    forward_steps(previous, phase) <= 2,
                    "{:?} -> {:?}", previous, phase
                );
                previous = phase;
            }
        }

        organ.cycles(16);
        let settled = organ.organ.stop_phase(0, 0).unwrap();
        let expected = if last_intent { StopPhase::Active } else { StopPhase::Inactive };
        prop_assert_eq!(settled, expected);
        prop_assert_eq!(organ.organ.stop_activated(0, 0), last_intent);
    }
}
