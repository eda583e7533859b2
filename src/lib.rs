//! # Aeolus - Real-time Pipe Organ Control Plane
//!
//! Synchronization core between a control surface, MIDI input and the audio
//! callback of a pipe organ synthesizer.
//!
//! ## Architecture
//!
//! Aeolus is an umbrella crate that coordinates:
//! - **aeolus-core** - Organ model, command/notification channels, audio-thread
//!   dispatcher, stop lifecycle, retuning and listeners
//! - **aeolus-midi** - Channel-to-division routing masks and the note queue
//!
//! ## Quick Start
//!
//! ```ignore
//! use aeolus::prelude::*;
//!
//! let definition = OrganDefinition::new("Chamber organ")
//!     .division(DivisionDefinition::new("Great").stop(StopDefinition::new("Gedackt 8")))
//!     .division(DivisionDefinition::new("Swell").with_tremulant());
//!
//! let mut organ = OrganContext::builder()
//!     .definition(definition)
//!     .sample_rate(48000.0)
//!     .build()?;
//!
//! // Audio thread
//! let mut audio = organ.take_audio(my_renderer).unwrap();
//! audio.fill_buffer(&mut buffer, 2);
//!
//! // Control thread
//! organ.set_updater(Some(Box::new(my_listener)));
//! organ.activate_stop(0, 0)?;
//! organ.poll_notifications();
//! ```

/// Re-export of aeolus-core for direct access
pub use aeolus_core as core;

/// Re-export of aeolus-midi for direct access
pub use aeolus_midi as midi;

pub use aeolus_core::{
    AudioDispatcher, Command, CycleReport, DivisionDefinition, DivisionVoice, Notification,
    OrganAudio, OrganConfig, OrganContext, OrganContextBuilder, OrganDefinition, OrganListener,
    RenderView, Renderer, StopDefinition, StopPhase, Temperament, TuningCatalog, WavetableSet,
};
pub use aeolus_midi::{DivisionMask, NoteEvent, NoteInput};

mod error;
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::{Error, Result};
}
