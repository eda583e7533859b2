//! Organ engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the organ control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganConfig {
    pub sample_rate: f64,
    /// Control → audio command slots.
    pub command_capacity: usize,
    /// Audio → control notification slots (per producer).
    pub notification_capacity: usize,
    /// MIDI → audio note slots.
    pub note_capacity: usize,
    /// Stop engage ramp, seconds.
    pub engage_time: f32,
    /// Stop release ramp, seconds.
    pub release_time: f32,
    /// Samples per single-cycle wavetable.
    pub wavetable_length: usize,
}

impl Default for OrganConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            command_capacity: 256,
            notification_capacity: 64,
            note_capacity: aeolus_midi::DEFAULT_NOTE_CAPACITY,
            engage_time: 0.005,
            release_time: 0.05,
            wavetable_length: 512,
        }
    }
}

impl OrganConfig {
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }

    pub fn with_note_capacity(mut self, capacity: usize) -> Self {
        self.note_capacity = capacity;
        self
    }

    pub fn with_engage_time(mut self, seconds: f32) -> Self {
        self.engage_time = seconds;
        self
    }

    pub fn with_release_time(mut self, seconds: f32) -> Self {
        self.release_time = seconds;
        self
    }

    pub fn with_wavetable_length(mut self, length: usize) -> Self {
        self.wavetable_length = length;
        self
    }

    /// Engage ramp in samples, never shorter than one sample.
    pub fn engage_samples(&self) -> u32 {
        seconds_to_samples(self.engage_time, self.sample_rate)
    }

    /// Release ramp in samples, never shorter than one sample.
    pub fn release_samples(&self) -> u32 {
        seconds_to_samples(self.release_time, self.sample_rate)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000.0 || self.sample_rate > 384000.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        for (name, capacity) in [
            ("command_capacity", self.command_capacity),
            ("notification_capacity", self.notification_capacity),
            ("note_capacity", self.note_capacity),
        ] {
            if capacity == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        for (name, seconds) in [
            ("engage_time", self.engage_time),
            ("release_time", self.release_time),
        ] {
            if !seconds.is_finite() || !(0.0..=10.0).contains(&seconds) {
                return Err(Error::InvalidConfig(format!(
                    "{name} {seconds} out of range (0-10 s)"
                )));
            }
        }
        if !(16..=65536).contains(&self.wavetable_length) {
            return Err(Error::InvalidConfig(format!(
                "wavetable_length {} out of range (16-65536)",
                self.wavetable_length
            )));
        }
        Ok(())
    }
}

fn seconds_to_samples(seconds: f32, sample_rate: f64) -> u32 {
    ((seconds as f64 * sample_rate).round() as u32).max(1)
}
