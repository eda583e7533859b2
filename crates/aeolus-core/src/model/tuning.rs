//! Temperament catalog.
//!
//! A temperament is twelve cent offsets measured from C. Combined with a base
//! frequency for A (pitch class 9) it yields a frequency for every MIDI note.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default base frequency for A4.
pub const A4_FREQ: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_NOTE: u8 = 69;

const PITCH_CLASS_A: usize = 9;

/// A named twelve-note temperament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperament {
    pub label: String,
    /// Short name shown on compact displays.
    pub mnemonic: String,
    /// Offsets of C, C#, ... B from C, in cents.
    pub cents: [f32; 12],
}

impl Temperament {
    pub fn new(label: impl Into<String>, mnemonic: impl Into<String>, cents: [f32; 12]) -> Self {
        Self {
            label: label.into(),
            mnemonic: mnemonic.into(),
            cents,
        }
    }

    pub fn equal() -> Self {
        let mut cents = [0.0; 12];
        for (i, c) in cents.iter_mut().enumerate() {
            *c = i as f32 * 100.0;
        }
        Self::new("Equal", "ET", cents)
    }

    pub fn pythagorean() -> Self {
        Self::new(
            "Pythagorean",
            "Pyth",
            [
                0.0, 113.685, 203.91, 294.135, 407.82, 498.045, 611.73, 701.955, 815.64, 905.865,
                996.09, 1109.775,
            ],
        )
    }

    pub fn meantone_quarter_comma() -> Self {
        Self::new(
            "Meantone 1/4",
            "MT4",
            [
                0.0, 76.049, 193.157, 310.265, 386.314, 503.422, 579.471, 696.579, 772.627,
                889.735, 1006.843, 1082.892,
            ],
        )
    }

    pub fn werckmeister_iii() -> Self {
        Self::new(
            "Werckmeister III",
            "WM3",
            [
                0.0, 90.225, 192.18, 294.135, 390.225, 498.045, 588.27, 696.09, 792.18, 888.27,
                996.09, 1092.18,
            ],
        )
    }

    pub fn kirnberger_iii() -> Self {
        Self::new(
            "Kirnberger III",
            "KB3",
            [
                0.0, 90.225, 193.157, 294.135, 386.314, 498.045, 590.224, 696.579, 792.18,
                889.735, 996.09, 1088.269,
            ],
        )
    }

    pub fn vallotti() -> Self {
        Self::new(
            "Vallotti",
            "Val",
            [
                0.0, 94.135, 196.09, 298.045, 392.18, 501.955, 592.18, 698.045, 796.09, 894.135,
                1000.0, 1090.225,
            ],
        )
    }

    /// Frequency of `note` when A4 sounds at `base_frequency`.
    pub fn note_frequency(&self, note: u8, base_frequency: f32) -> f32 {
        let pitch_class = note as usize % 12;
        let octave_diff = (note as i32 / 12) - (A4_NOTE as i32 / 12);
        let cents_diff =
            self.cents[pitch_class] - self.cents[PITCH_CLASS_A] + octave_diff as f32 * 1200.0;
        base_frequency * 2.0_f32.powf(cents_diff / 1200.0)
    }

    fn validate(&self) -> Result<()> {
        if self.label.is_empty() {
            return Err(Error::InvalidDefinition(
                "temperament label must not be empty".into(),
            ));
        }
        if self.cents.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidDefinition(format!(
                "temperament '{}' has non-finite offsets",
                self.label
            )));
        }
        if self.cents[0] != 0.0 || self.cents.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidDefinition(format!(
                "temperament '{}' must start at 0 and ascend",
                self.label
            )));
        }
        if self.cents[11] >= 1200.0 {
            return Err(Error::InvalidDefinition(format!(
                "temperament '{}' exceeds one octave",
                self.label
            )));
        }
        Ok(())
    }
}

/// Immutable, ordered list of temperaments. Indices are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TuningCatalog {
    temperaments: Vec<Temperament>,
}

impl TuningCatalog {
    pub fn new(temperaments: Vec<Temperament>) -> Self {
        Self { temperaments }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.temperaments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.temperaments.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Temperament> {
        self.temperaments.get(index)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.get(index).map(|t| t.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Temperament> {
        self.temperaments.iter()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidDefinition(
                "tuning catalog must not be empty".into(),
            ));
        }
        self.temperaments.iter().try_for_each(Temperament::validate)
    }
}

impl Default for TuningCatalog {
    fn default() -> Self {
        Self::new(vec![
            Temperament::equal(),
            Temperament::pythagorean(),
            Temperament::meantone_quarter_comma(),
            Temperament::werckmeister_iii(),
            Temperament::kirnberger_iii(),
            Temperament::vallotti(),
        ])
    }
}
