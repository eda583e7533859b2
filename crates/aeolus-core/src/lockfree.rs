//! Lock-free primitives shared between the audio and control threads.

use crate::model::StopPhase;
use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Cache-line aligned atomic f32.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFloat {
    value: AtomicF32,
}

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    #[inline]
    pub fn swap(&self, value: bool) -> bool {
        self.value.swap(value, Ordering::AcqRel)
    }

    /// Flip the flag, returning the new value.
    #[inline]
    pub fn toggle(&self) -> bool {
        !self.value.fetch_xor(true, Ordering::AcqRel)
    }
}

/// A [`StopPhase`] packed into one byte so readers never see a torn value.
#[derive(Debug, Default)]
pub struct AtomicPhase {
    value: AtomicU8,
}

impl AtomicPhase {
    #[inline]
    pub fn get(&self) -> StopPhase {
        StopPhase::from_u8(self.value.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, phase: StopPhase) {
        self.value.store(phase.to_u8(), Ordering::Release);
    }
}
