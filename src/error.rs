//! Centralized error type for the aeolus umbrella crate.
//!
//! Wraps both subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] aeolus_core::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] aeolus_midi::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
