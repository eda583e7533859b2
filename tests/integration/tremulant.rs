//! Tremulant integration tests

use crate::helpers::*;
use aeolus::core::Error as CoreError;
use aeolus::prelude::*;

#[test]
fn test_toggle_flips_and_notifies() {
    let mut organ = TestOrgan::loaded();
    organ.recorder.clear();

    assert!(organ.organ.has_tremulant(1));
    organ.organ.toggle_tremulant(1).unwrap();
    assert!(!organ.organ.tremulant_is_active(1));

    organ.cycle();
    assert!(organ.organ.tremulant_is_active(1));
    assert!(organ.audio.dispatcher().voices()[1].tremulant_active());
    assert_eq!(organ.recorder.events(), vec![Notification::StopsUpdated]);

    organ.organ.toggle_tremulant(1).unwrap();
    organ.cycle();
    assert!(!organ.organ.tremulant_is_active(1));
    assert_eq!(organ.recorder.count(Notification::StopsUpdated), 2);
}

#[test]
fn test_double_toggle_in_one_cycle_cancels() {
    let mut organ = TestOrgan::loaded();
    organ.recorder.clear();

    organ.organ.toggle_tremulant(1).unwrap();
    organ.organ.toggle_tremulant(1).unwrap();
    organ.cycle();

    assert!(!organ.organ.tremulant_is_active(1));
    assert_eq!(organ.recorder.count(Notification::StopsUpdated), 1);
}

#[test]
fn test_division_without_tremulant_is_untouched() {
    let mut organ = TestOrgan::loaded();
    organ.recorder.clear();

    for division in [0, 2] {
        assert!(!organ.organ.has_tremulant(division));
        organ.organ.toggle_tremulant(division).unwrap();
    }
    organ.cycles(4);

    assert!(!organ.organ.tremulant_is_active(0));
    assert!(!organ.organ.tremulant_is_active(2));
    assert!(organ.recorder.events().is_empty());
}

#[test]
fn test_unknown_division_is_rejected() {
    let mut organ = TestOrgan::new();
    assert!(matches!(
        organ.organ.toggle_tremulant(3),
        Err(CoreError::InvalidDivision(3))
    ));
    assert!(!organ.organ.has_tremulant(3));
    assert!(!organ.organ.tremulant_is_active(3));
}
