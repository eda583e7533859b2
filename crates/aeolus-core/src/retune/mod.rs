//! Wavetable retuning off the audio thread.

mod coordinator;
mod wavetable;

pub use coordinator::{RetuneCoordinator, RetuneRequest};
pub use wavetable::{NoteTable, WavetableSet};
