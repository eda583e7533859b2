//! Error types for aeolus-core.

use thiserror::Error;

/// Error type for aeolus-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid organ definition: {0}")]
    InvalidDefinition(String),

    #[error("Division {0} does not exist")]
    InvalidDivision(usize),

    #[error("Stop {stop} does not exist in division {division}")]
    InvalidStop { division: usize, stop: usize },

    #[error("Invalid gain: {0}. Must be finite and non-negative")]
    InvalidGain(f32),

    #[error("Temperament {0} is not in the tuning catalog")]
    InvalidTemperament(usize),

    #[error("Invalid base frequency: {0} Hz. Must be finite and positive")]
    InvalidFrequency(f32),

    #[error("Command channel full")]
    ChannelFull,

    #[error("Organ has been shut down")]
    ShutDown,

    #[error("Worker thread error: {0}")]
    Worker(String),

    #[error(transparent)]
    Midi(#[from] aeolus_midi::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
