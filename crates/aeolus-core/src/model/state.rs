//! Runtime organ state shared between the control, audio and retune threads.
//!
//! # Writers
//!
//! | field                | writer            |
//! |----------------------|-------------------|
//! | stop `target`        | control thread    |
//! | stop `phase`         | audio dispatcher  |
//! | division `gain`      | audio dispatcher  |
//! | `tremulant_active`   | audio dispatcher  |
//! | MIDI route masks     | audio dispatcher  |
//! | `wavetables`         | retune worker     |
//! | retune `latest`      | control thread    |
//! | retune `completed`   | retune worker     |
//!
//! Topology (labels, counts, tremulant presence, catalog) comes from the
//! [`OrganDefinition`] and is never written after construction.

use super::definition::OrganDefinition;
use crate::lockfree::{AtomicFlag, AtomicFloat, AtomicPhase};
use crate::retune::WavetableSet;
use crate::{Error, Result};
use aeolus_midi::{DivisionMask, MidiRouteTable};
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle phase of a stop.
///
/// Phases always advance in this order, wrapping from `Releasing` back to
/// `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StopPhase {
    #[default]
    Inactive,
    Activating,
    Active,
    Releasing,
}

impl StopPhase {
    pub fn to_u8(self) -> u8 {
        match self {
            StopPhase::Inactive => 0,
            StopPhase::Activating => 1,
            StopPhase::Active => 2,
            StopPhase::Releasing => 3,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => StopPhase::Activating,
            2 => StopPhase::Active,
            3 => StopPhase::Releasing,
            _ => StopPhase::Inactive,
        }
    }

    /// The phase that follows this one.
    pub fn successor(self) -> Self {
        match self {
            StopPhase::Inactive => StopPhase::Activating,
            StopPhase::Activating => StopPhase::Active,
            StopPhase::Active => StopPhase::Releasing,
            StopPhase::Releasing => StopPhase::Inactive,
        }
    }

    /// The confirmed on/off state reported to the control side.
    ///
    /// A stop counts as on once its engage ramp has finished and stays on until
    /// its release ramp has finished.
    #[inline]
    pub fn is_confirmed(self) -> bool {
        matches!(self, StopPhase::Active | StopPhase::Releasing)
    }
}

/// Validated (division, stop) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StopId {
    pub division: u8,
    pub stop: u8,
}

#[derive(Debug, Default)]
pub(crate) struct StopState {
    pub(crate) target: AtomicFlag,
    pub(crate) phase: AtomicPhase,
}

#[derive(Debug)]
pub(crate) struct DivisionState {
    pub(crate) gain: AtomicFloat,
    pub(crate) tremulant_active: AtomicFlag,
    pub(crate) stops: Box<[StopState]>,
}

/// Retune request bookkeeping.
///
/// `latest` is the id of the newest accepted request, `completed` the id of
/// the newest published one. Retuning is in progress whenever they differ.
#[derive(Debug, Default)]
pub(crate) struct RetuneStatus {
    latest: AtomicU64,
    completed: AtomicU64,
}

impl RetuneStatus {
    /// Id for the next request. Only the control thread issues ids.
    pub(crate) fn next_id(&self) -> u64 {
        self.latest() + 1
    }

    /// Record `id` as accepted. Must happen before the request reaches the
    /// worker so older work in flight already reads as stale.
    pub(crate) fn accept(&self, id: u64) {
        self.latest.fetch_max(id, Ordering::AcqRel);
    }

    /// Undo [`accept`](Self::accept) for a request the worker never received.
    /// A no-op if a newer id has been accepted since.
    pub(crate) fn withdraw(&self, id: u64) {
        let _ = self.latest.compare_exchange(
            id,
            id.saturating_sub(1),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    #[inline]
    pub(crate) fn latest(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn complete(&self, id: u64) {
        self.completed.fetch_max(id, Ordering::AcqRel);
    }

    #[inline]
    pub(crate) fn in_progress(&self) -> bool {
        self.completed.load(Ordering::Acquire) < self.latest()
    }
}

/// Shared organ state. Held behind an `Arc` by every thread.
pub struct OrganModel {
    definition: OrganDefinition,
    pub(crate) divisions: Box<[DivisionState]>,
    pub(crate) routes: MidiRouteTable,
    pub(crate) wavetables: ArcSwapOption<WavetableSet>,
    pub(crate) retune: RetuneStatus,
    pub(crate) loaded: AtomicFlag,
    pub(crate) halted: AtomicFlag,
}

impl std::fmt::Debug for OrganModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganModel")
            .field("name", &self.definition.name)
            .field("divisions", &self.divisions.len())
            .field("loaded", &self.loaded.get())
            .field("halted", &self.halted.get())
            .finish()
    }
}

impl OrganModel {
    /// Build runtime state from a validated definition.
    pub fn new(definition: OrganDefinition) -> Result<Self> {
        definition.validate()?;

        let divisions = definition
            .divisions
            .iter()
            .map(|division| DivisionState {
                gain: AtomicFloat::new(division.gain),
                tremulant_active: AtomicFlag::new(false),
                stops: division.stops.iter().map(|_| StopState::default()).collect(),
            })
            .collect();
        let routes = MidiRouteTable::with_routes(&definition.midi_routes)?;

        Ok(Self {
            definition,
            divisions,
            routes,
            wavetables: ArcSwapOption::empty(),
            retune: RetuneStatus::default(),
            loaded: AtomicFlag::new(false),
            halted: AtomicFlag::new(false),
        })
    }

    #[inline]
    pub fn definition(&self) -> &OrganDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    // Lenient queries: out-of-range addressing reads as absent.

    #[inline]
    pub fn division_count(&self) -> usize {
        self.divisions.len()
    }

    pub fn division_label(&self, division: usize) -> Option<&str> {
        self.definition
            .divisions
            .get(division)
            .map(|d| d.label.as_str())
    }

    pub fn stop_count(&self, division: usize) -> usize {
        self.divisions.get(division).map_or(0, |d| d.stops.len())
    }

    pub fn stop_label(&self, division: usize, stop: usize) -> Option<&str> {
        self.definition
            .divisions
            .get(division)
            .and_then(|d| d.stops.get(stop))
            .map(|s| s.label.as_str())
    }

    pub fn stop_phase(&self, division: usize, stop: usize) -> Option<StopPhase> {
        self.stop_state(division, stop).map(|s| s.phase.get())
    }

    /// Confirmed activation state, as last published by the audio thread.
    pub fn stop_activated(&self, division: usize, stop: usize) -> bool {
        self.stop_phase(division, stop)
            .is_some_and(StopPhase::is_confirmed)
    }

    /// Activation intent, as last requested by the control thread.
    pub fn stop_target(&self, division: usize, stop: usize) -> bool {
        self.stop_state(division, stop)
            .is_some_and(|s| s.target.get())
    }

    pub fn has_tremulant(&self, division: usize) -> bool {
        self.definition
            .divisions
            .get(division)
            .is_some_and(|d| d.tremulant)
    }

    pub fn tremulant_is_active(&self, division: usize) -> bool {
        self.divisions
            .get(division)
            .is_some_and(|d| d.tremulant_active.get())
    }

    pub fn division_volume(&self, division: usize) -> Option<f32> {
        self.divisions.get(division).map(|d| d.gain.get())
    }

    #[inline]
    pub fn query_midi_map(&self, channel: u8) -> DivisionMask {
        self.routes.mask(channel)
    }

    #[inline]
    pub fn routes(&self) -> &MidiRouteTable {
        &self.routes
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted.get()
    }

    #[inline]
    pub fn is_retuning(&self) -> bool {
        self.retune.in_progress()
    }

    /// Currently published wavetable set, if any.
    pub fn wavetables(&self) -> Option<std::sync::Arc<WavetableSet>> {
        self.wavetables.load_full()
    }

    // Strict addressing for mutating commands.

    pub(crate) fn check_division(&self, division: usize) -> Result<u8> {
        if division >= self.divisions.len() {
            return Err(Error::InvalidDivision(division));
        }
        Ok(division as u8)
    }

    pub(crate) fn check_stop(&self, division: usize, stop: usize) -> Result<StopId> {
        let d = self.check_division(division)?;
        if stop >= self.divisions[division].stops.len() {
            return Err(Error::InvalidStop { division, stop });
        }
        Ok(StopId {
            division: d,
            stop: stop as u8,
        })
    }

    #[inline]
    pub(crate) fn stop_state(&self, division: usize, stop: usize) -> Option<&StopState> {
        self.divisions.get(division).and_then(|d| d.stops.get(stop))
    }
}
