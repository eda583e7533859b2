//! Instrument definition: the write-once topology handed over by the loader.

use super::tuning::{TuningCatalog, A4_FREQ};
use crate::{Error, Result};
use aeolus_midi::DivisionMask;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Upper bound on divisions per instrument.
pub const MAX_DIVISIONS: usize = 8;

/// Upper bound on stops per division.
pub const MAX_STOPS_PER_DIVISION: usize = 32;

/// A stop engages one rank or a mixture of at most this many ranks.
pub const MAX_RANKS_PER_STOP: usize = 5;

/// Ranks engaged by one stop.
pub type RankList = SmallVec<[u16; MAX_RANKS_PER_STOP]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopDefinition {
    pub label: String,
    #[serde(default)]
    pub ranks: RankList,
}

impl StopDefinition {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ranks: RankList::new(),
        }
    }

    pub fn rank(mut self, rank: u16) -> Self {
        self.ranks.push(rank);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionDefinition {
    pub label: String,
    #[serde(default)]
    pub tremulant: bool,
    #[serde(default = "unity_gain")]
    pub gain: f32,
    #[serde(default)]
    pub stops: Vec<StopDefinition>,
}

fn unity_gain() -> f32 {
    1.0
}

impl DivisionDefinition {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tremulant: false,
            gain: 1.0,
            stops: Vec::new(),
        }
    }

    pub fn with_tremulant(mut self) -> Self {
        self.tremulant = true;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn stop(mut self, stop: StopDefinition) -> Self {
        self.stops.push(stop);
        self
    }
}

/// Full instrument topology.
///
/// Division and stop indices are positions in these vectors and stay fixed for
/// the lifetime of the organ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganDefinition {
    pub name: String,
    pub divisions: Vec<DivisionDefinition>,
    #[serde(default)]
    pub tunings: TuningCatalog,
    #[serde(default)]
    pub initial_temperament: usize,
    #[serde(default = "default_base_frequency")]
    pub base_frequency: f32,
    /// Initial `(channel, mask)` routing.
    #[serde(default)]
    pub midi_routes: Vec<(u8, DivisionMask)>,
}

fn default_base_frequency() -> f32 {
    A4_FREQ
}

impl OrganDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            divisions: Vec::new(),
            tunings: TuningCatalog::default(),
            initial_temperament: 0,
            base_frequency: A4_FREQ,
            midi_routes: Vec::new(),
        }
    }

    pub fn division(mut self, division: DivisionDefinition) -> Self {
        self.divisions.push(division);
        self
    }

    pub fn tunings(mut self, catalog: TuningCatalog) -> Self {
        self.tunings = catalog;
        self
    }

    pub fn initial_tuning(mut self, temperament: usize, base_frequency: f32) -> Self {
        self.initial_temperament = temperament;
        self.base_frequency = base_frequency;
        self
    }

    pub fn route(mut self, channel: u8, mask: DivisionMask) -> Self {
        self.midi_routes.push((channel, mask));
        self
    }

    /// Startup check. Any failure here is fatal: no command traffic may start
    /// on a definition that does not validate.
    pub fn validate(&self) -> Result<()> {
        if self.divisions.is_empty() {
            return Err(Error::InvalidDefinition("no divisions".into()));
        }
        if self.divisions.len() > MAX_DIVISIONS {
            return Err(Error::InvalidDefinition(format!(
                "{} divisions exceeds the limit of {MAX_DIVISIONS}",
                self.divisions.len()
            )));
        }

        for (d, division) in self.divisions.iter().enumerate() {
            if !division.gain.is_finite() || division.gain < 0.0 {
                return Err(Error::InvalidDefinition(format!(
                    "division {d} has invalid gain {}",
                    division.gain
                )));
            }
            if division.stops.len() > MAX_STOPS_PER_DIVISION {
                return Err(Error::InvalidDefinition(format!(
                    "division {d} has {} stops, limit is {MAX_STOPS_PER_DIVISION}",
                    division.stops.len()
                )));
            }
            for (s, stop) in division.stops.iter().enumerate() {
                if stop.ranks.len() > MAX_RANKS_PER_STOP {
                    return Err(Error::InvalidDefinition(format!(
                        "stop {d}:{s} '{}' engages {} ranks, limit is {MAX_RANKS_PER_STOP}",
                        stop.label,
                        stop.ranks.len()
                    )));
                }
            }
        }

        self.tunings.validate()?;
        if self.initial_temperament >= self.tunings.len() {
            return Err(Error::InvalidDefinition(format!(
                "initial temperament {} not in catalog",
                self.initial_temperament
            )));
        }
        if !self.base_frequency.is_finite() || self.base_frequency <= 0.0 {
            return Err(Error::InvalidDefinition(format!(
                "base frequency {} must be positive",
                self.base_frequency
            )));
        }
        for &(channel, mask) in &self.midi_routes {
            if channel as usize >= aeolus_midi::MIDI_CHANNELS {
                return Err(Error::InvalidDefinition(format!(
                    "route on channel {channel} out of range"
                )));
            }
            if let Some(division) = mask.divisions().find(|&d| d as usize >= self.divisions.len()) {
                return Err(Error::InvalidDefinition(format!(
                    "channel {channel} routed to missing division {division}"
                )));
            }
        }
        Ok(())
    }
}
