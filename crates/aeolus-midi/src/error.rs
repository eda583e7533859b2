//! Error types for MIDI routing and ingestion.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("MIDI channel {0} out of range (0-15)")]
    ChannelOutOfRange(u8),

    #[error("Division {0} cannot be routed (mask holds divisions 0-3)")]
    DivisionOutOfRange(u8),

    #[error("MIDI parse error: {0}")]
    Parse(String),
}

impl From<midi_msg::ParseError> for Error {
    fn from(err: midi_msg::ParseError) -> Self {
        Error::Parse(format!("{err:?}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
