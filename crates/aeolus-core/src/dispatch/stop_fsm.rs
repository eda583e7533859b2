//! Stop activation state machine.
//!
//! ```text
//!            Activate                 ramp done
//! Inactive ───────────▶ Activating ────────────▶ Active
//!    ▲                                             │
//!    │ ramp done                       Deactivate  │
//!    └──────────────── Releasing ◀─────────────────┘
//! ```
//!
//! Requests only set the target. A transient phase always runs its ramp to the
//! next stable phase before the opposite transition starts, so phases are
//! never skipped.

use crate::model::StopPhase;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    Activate,
    Deactivate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Target already matches where the stop is heading.
    None,
    /// The request started a transition immediately.
    Entered(StopPhase),
    /// A ramp is running; the request applies once it finishes.
    Deferred,
}

/// Phases entered during one [`StopFsm::advance`], in order.
pub type PhaseTrail = SmallVec<[StopPhase; 4]>;

#[derive(Debug, Clone)]
pub struct StopFsm {
    phase: StopPhase,
    wants_active: bool,
    samples_remaining: u32,
    engage_samples: u32,
    release_samples: u32,
}

impl StopFsm {
    pub fn new(engage_samples: u32, release_samples: u32) -> Self {
        Self {
            phase: StopPhase::Inactive,
            wants_active: false,
            samples_remaining: 0,
            engage_samples: engage_samples.max(1),
            release_samples: release_samples.max(1),
        }
    }

    #[inline]
    pub fn phase(&self) -> StopPhase {
        self.phase
    }

    #[inline]
    pub fn wants_active(&self) -> bool {
        self.wants_active
    }

    #[inline]
    pub fn samples_remaining(&self) -> u32 {
        self.samples_remaining
    }

    /// Envelope level in `0.0..=1.0` at the current position.
    pub fn level(&self) -> f32 {
        match self.phase {
            StopPhase::Inactive => 0.0,
            StopPhase::Active => 1.0,
            StopPhase::Activating => {
                1.0 - self.samples_remaining as f32 / self.engage_samples as f32
            }
            StopPhase::Releasing => self.samples_remaining as f32 / self.release_samples as f32,
        }
    }

    pub fn request(&mut self, request: StopRequest) -> TransitionResult {
        self.wants_active = request == StopRequest::Activate;

        match (self.phase, request) {
            (StopPhase::Inactive, StopRequest::Activate) => {
                self.enter(StopPhase::Activating);
                TransitionResult::Entered(StopPhase::Activating)
            }
            (StopPhase::Active, StopRequest::Deactivate) => {
                self.enter(StopPhase::Releasing);
                TransitionResult::Entered(StopPhase::Releasing)
            }
            (StopPhase::Activating, StopRequest::Deactivate)
            | (StopPhase::Releasing, StopRequest::Activate) => TransitionResult::Deferred,
            _ => TransitionResult::None,
        }
    }

    /// Run `frames` samples of ramp time, returning every phase entered.
    pub fn advance(&mut self, frames: u32) -> PhaseTrail {
        let mut trail = PhaseTrail::new();
        let mut budget = frames;

        loop {
            match self.phase {
                StopPhase::Activating | StopPhase::Releasing => {
                    let step = budget.min(self.samples_remaining);
                    self.samples_remaining -= step;
                    budget -= step;
                    if self.samples_remaining > 0 {
                        break;
                    }
                }
                StopPhase::Active if !self.wants_active => {}
                StopPhase::Inactive if self.wants_active => {}
                StopPhase::Active | StopPhase::Inactive => break,
            }
            let next = self.phase.successor();
            self.enter(next);
            trail.push(next);
        }
        trail
    }

    fn enter(&mut self, phase: StopPhase) {
        self.phase = phase;
        self.samples_remaining = match phase {
            StopPhase::Activating => self.engage_samples,
            StopPhase::Releasing => self.release_samples,
            StopPhase::Inactive | StopPhase::Active => 0,
        };
    }
}
