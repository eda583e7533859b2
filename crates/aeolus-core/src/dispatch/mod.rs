//! Audio-thread dispatcher.
//!
//! Called once per render cycle, before samples are produced:
//!
//! 1. drain the command channel (at most its capacity, so work per cycle is bounded)
//! 2. drain the note queue through the MIDI routing masks
//! 3. advance every stop ramp by the cycle length and publish phases
//! 4. emit at most one `LoadComplete` and one coalesced `StopsUpdated`
//!
//! # RT Safety
//!
//! Nothing here allocates, locks or logs. All per-stop and per-division storage
//! is sized from the topology when the dispatcher is built.

mod stop_fsm;

pub use stop_fsm::{PhaseTrail, StopFsm, StopRequest, TransitionResult};

use crate::channel::{Command, CommandConsumer, Notification, NotificationProducer};
use crate::config::OrganConfig;
use crate::model::{OrganModel, StopId, StopPhase};
use aeolus_midi::{KeySet, NoteQueue};
use std::sync::Arc;

/// Per-division render state, rebuilt every cycle.
#[derive(Debug, Clone)]
pub struct DivisionVoice {
    gain: f32,
    tremulant: bool,
    keys: KeySet,
    stop_levels: Box<[f32]>,
}

impl DivisionVoice {
    fn new(stops: usize) -> Self {
        Self {
            gain: 1.0,
            tremulant: false,
            keys: KeySet::EMPTY,
            stop_levels: vec![0.0; stops].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn tremulant_active(&self) -> bool {
        self.tremulant
    }

    #[inline]
    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Envelope level of each stop at the end of the cycle.
    #[inline]
    pub fn stop_levels(&self) -> &[f32] {
        &self.stop_levels
    }

    /// Summed stop level; zero means the division is silent.
    pub fn registration_level(&self) -> f32 {
        self.stop_levels.iter().sum()
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub commands: usize,
    pub notes: usize,
    /// A confirmed stop state or tremulant changed this cycle.
    pub stops_changed: bool,
    pub load_completed: bool,
    /// The dispatcher has drained `Shutdown` and is halted.
    pub halted: bool,
}

/// Drains commands and advances stop lifecycles on the audio thread.
pub struct AudioDispatcher {
    model: Arc<OrganModel>,
    commands: CommandConsumer,
    notes: NoteQueue,
    notifier: NotificationProducer,
    stops: Box<[Box<[StopFsm]>]>,
    voices: Box<[DivisionVoice]>,
    sample_rate: f64,
    note_budget: usize,
    stops_update_pending: bool,
    load_complete_pending: bool,
    load_announced: bool,
    halted: bool,
}

impl AudioDispatcher {
    pub(crate) fn new(
        model: Arc<OrganModel>,
        commands: CommandConsumer,
        notes: NoteQueue,
        notifier: NotificationProducer,
        config: &OrganConfig,
    ) -> Self {
        let engage = config.engage_samples();
        let release = config.release_samples();
        let stops = (0..model.division_count())
            .map(|d| {
                (0..model.stop_count(d))
                    .map(|_| StopFsm::new(engage, release))
                    .collect()
            })
            .collect();
        let voices = (0..model.division_count())
            .map(|d| DivisionVoice::new(model.stop_count(d)))
            .collect();

        Self {
            model,
            commands,
            notes,
            notifier,
            stops,
            voices,
            sample_rate: config.sample_rate,
            note_budget: config.note_capacity,
            stops_update_pending: false,
            load_complete_pending: false,
            load_announced: false,
            halted: false,
        }
    }

    #[inline]
    pub fn model(&self) -> &Arc<OrganModel> {
        &self.model
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn voices(&self) -> &[DivisionVoice] {
        &self.voices
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Run one cycle of `frames` samples.
    pub fn process(&mut self, frames: usize) -> CycleReport {
        let tables_ready = self.model.wavetables.load().is_some();
        self.run_cycle(frames, tables_ready)
    }

    /// Cycle body; `tables_ready` is sampled once per cycle by the caller.
    pub(crate) fn run_cycle(&mut self, frames: usize, tables_ready: bool) -> CycleReport {
        let mut report = CycleReport::default();
        if self.halted {
            report.halted = true;
            return report;
        }

        let budget = self.commands.capacity();
        while report.commands < budget {
            let Some(command) = self.commands.pop() else {
                break;
            };
            report.commands += 1;
            if self.apply(command) {
                self.halt();
                report.halted = true;
                return report;
            }
        }

        report.notes = self.route_notes();
        report.stops_changed = self.advance_stops(frames) | self.stops_update_pending;
        self.stops_update_pending |= report.stops_changed;

        if !self.load_announced && tables_ready {
            self.load_announced = true;
            self.load_complete_pending = true;
            self.model.loaded.set(true);
            report.load_completed = true;
        }

        self.flush_notifications();
        report
    }

    /// Apply one command. Returns true on `Shutdown`.
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::ActivateStop(id) => self.request_stop(id, StopRequest::Activate),
            Command::DeactivateStop(id) => self.request_stop(id, StopRequest::Deactivate),
            Command::ToggleTremulant { division } => {
                let d = division as usize;
                if self.model.has_tremulant(d) {
                    self.model.divisions[d].tremulant_active.toggle();
                    self.stops_update_pending = true;
                }
            }
            Command::SetDivisionVolume { division, gain } => {
                if let Some(state) = self.model.divisions.get(division as usize) {
                    state.gain.set(gain);
                }
            }
            Command::SetMidiMapping(toggle) => {
                self.model.routes.apply(toggle);
            }
            Command::Shutdown => return true,
        }
        false
    }

    fn request_stop(&mut self, id: StopId, request: StopRequest) {
        let (d, s) = (id.division as usize, id.stop as usize);
        let Some(fsm) = self.stops.get_mut(d).and_then(|stops| stops.get_mut(s)) else {
            return;
        };
        if let TransitionResult::Entered(phase) = fsm.request(request) {
            self.model.divisions[d].stops[s].phase.set(phase);
        }
    }

    fn route_notes(&mut self) -> usize {
        let voices = &mut self.voices;
        let routes = &self.model.routes;
        self.notes.drain_bounded(self.note_budget, |event| {
            for division in routes.mask(event.channel).divisions() {
                if let Some(voice) = voices.get_mut(division as usize) {
                    if event.is_on() {
                        voice.keys.press(event.key);
                    } else {
                        voice.keys.release(event.key);
                    }
                }
            }
        })
    }

    /// Advance every ramp. Returns true if any confirmed state flipped.
    fn advance_stops(&mut self, frames: usize) -> bool {
        let frames = u32::try_from(frames).unwrap_or(u32::MAX);
        let mut changed = false;

        for (d, fsms) in self.stops.iter_mut().enumerate() {
            let state = &self.model.divisions[d];
            let voice = &mut self.voices[d];

            for (s, fsm) in fsms.iter_mut().enumerate() {
                let trail = fsm.advance(frames);
                if let Some(&last) = trail.last() {
                    state.stops[s].phase.set(last);
                    changed |= trail
                        .iter()
                        .any(|p| matches!(p, StopPhase::Active | StopPhase::Inactive));
                }
                voice.stop_levels[s] = fsm.level();
            }
            voice.gain = state.gain.get();
            voice.tremulant = state.tremulant_active.get();
        }
        changed
    }

    fn flush_notifications(&mut self) {
        // A full channel keeps the flag set and retries next cycle.
        if self.load_complete_pending && self.notifier.push(Notification::LoadComplete) {
            self.load_complete_pending = false;
        }
        if self.stops_update_pending && self.notifier.push(Notification::StopsUpdated) {
            self.stops_update_pending = false;
        }
    }

    fn halt(&mut self) {
        self.halted = true;
        for voice in self.voices.iter_mut() {
            voice.keys.clear();
            voice.stop_levels.fill(0.0);
        }
        self.model.halted.set(true);
    }
}
