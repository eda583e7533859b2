//! Per-note wavetables derived from a temperament and base frequency.

use crate::model::Temperament;
use aeolus_midi::{COMPASS_HIGH, COMPASS_LOW};
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Relative amplitudes of the partials of the reference pipe voice.
const PARTIALS: [f32; 6] = [1.0, 0.5, 0.3, 0.18, 0.1, 0.06];

/// A single-cycle table for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTable {
    pub note: u8,
    pub frequency: f32,
    pub samples: Box<[f32]>,
}

impl NoteTable {
    /// Table lookup with linear interpolation, `phase` in cycles.
    #[inline]
    pub fn sample_at(&self, phase: f32) -> f32 {
        let len = self.samples.len();
        let pos = phase.fract() * len as f32;
        let i = pos as usize % len;
        let frac = pos - pos.floor();
        let a = self.samples[i];
        let b = self.samples[(i + 1) % len];
        a + (b - a) * frac
    }
}

/// A complete, immutable set of note tables for one tuning.
///
/// Published once by the retune worker and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct WavetableSet {
    request_id: u64,
    temperament: usize,
    base_frequency: f32,
    notes: Box<[NoteTable]>,
}

impl WavetableSet {
    /// Compute tables for every compass key.
    ///
    /// Partials above Nyquist are dropped per note, so the table content
    /// depends on the tuning and not only the stored frequency.
    pub fn compute(
        request_id: u64,
        temperament_index: usize,
        temperament: &Temperament,
        base_frequency: f32,
        sample_rate: f64,
        length: usize,
    ) -> Self {
        let nyquist = (sample_rate / 2.0) as f32;
        let notes: Vec<NoteTable> = (COMPASS_LOW..=COMPASS_HIGH)
            .into_par_iter()
            .map(|note| {
                let frequency = temperament.note_frequency(note, base_frequency);
                NoteTable {
                    note,
                    frequency,
                    samples: render_cycle(frequency, nyquist, length),
                }
            })
            .collect();

        Self {
            request_id,
            temperament: temperament_index,
            base_frequency,
            notes: notes.into_boxed_slice(),
        }
    }

    /// Id of the retune request this set answers; 0 for the initial load.
    #[inline]
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    #[inline]
    pub fn temperament(&self) -> usize {
        self.temperament
    }

    #[inline]
    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    #[inline]
    pub fn note(&self, key: u8) -> Option<&NoteTable> {
        key.checked_sub(COMPASS_LOW)
            .and_then(|offset| self.notes.get(offset as usize))
    }

    #[inline]
    pub fn notes(&self) -> &[NoteTable] {
        &self.notes
    }
}

fn render_cycle(frequency: f32, nyquist: f32, length: usize) -> Box<[f32]> {
    let norm: f32 = PARTIALS
        .iter()
        .enumerate()
        .filter(|(h, _)| frequency * (*h as f32 + 1.0) < nyquist)
        .map(|(_, a)| a)
        .sum::<f32>()
        .max(f32::EPSILON);

    (0..length)
        .map(|i| {
            let t = i as f32 / length as f32;
            PARTIALS
                .iter()
                .enumerate()
                .take_while(|(h, _)| frequency * (*h as f32 + 1.0) < nyquist)
                .map(|(h, a)| a * (TAU * (h as f32 + 1.0) * t).sin())
                .sum::<f32>()
                / norm
        })
        .collect()
}
