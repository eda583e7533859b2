//! Real-time synchronization core for a pipe organ control plane.
//!
//! # Primary API
//!
//! - [`OrganContext`] / [`OrganContextBuilder`]: control-thread entry point
//! - [`AudioDispatcher`] / [`OrganAudio`]: audio-thread half, one cycle per buffer
//! - [`RetuneCoordinator`]: background wavetable computation with atomic publish
//! - [`OrganListener`]: change notifications drained on the control thread
//!
//! # Threads
//!
//! | thread  | owns                                                    |
//! |---------|---------------------------------------------------------|
//! | control | [`OrganContext`], command producer, notification inbox  |
//! | audio   | [`AudioDispatcher`], command consumer, note queue       |
//! | MIDI    | [`aeolus_midi::NoteInput`]                              |
//! | retune  | worker spawned by [`RetuneCoordinator`]                 |
//!
//! # Example
//!
//! ```ignore
//! use aeolus_core::prelude::*;
//!
//! let definition = OrganDefinition::new("Chamber organ")
//!     .division(DivisionDefinition::new("Great").stop(StopDefinition::new("Gedackt 8")));
//! let mut organ = OrganContext::builder().definition(definition).build()?;
//! let mut audio = organ.take_audio(|_view: &RenderView<'_>, _out: &mut [f32]| {}).unwrap();
//!
//! organ.activate_stop(0, 0)?;
//! audio.fill_buffer(&mut [0.0; 512], 2);
//! organ.poll_notifications();
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::OrganConfig;

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat};

pub mod model;
pub use model::{
    DivisionDefinition, OrganDefinition, OrganModel, StopDefinition, StopId, StopPhase,
    Temperament, TuningCatalog,
};

pub mod channel;
pub use channel::{Command, Notification};

pub mod dispatch;
pub use dispatch::{AudioDispatcher, CycleReport, DivisionVoice};

pub mod retune;
pub use retune::{NoteTable, RetuneCoordinator, RetuneRequest, WavetableSet};

pub mod render;
pub use render::{OrganAudio, RenderView, Renderer};

pub mod listener;
pub use listener::{ListenerRegistry, OrganListener};

mod context;
pub use context::{OrganContext, OrganContextBuilder};

pub mod prelude {
    //! Common imports for hosts embedding the organ core.
    pub use crate::{
        AudioDispatcher, CycleReport, DivisionDefinition, DivisionVoice, Error, Notification,
        OrganAudio, OrganConfig, OrganContext, OrganDefinition, OrganListener, RenderView,
        Renderer, Result, StopDefinition, StopPhase, Temperament, TuningCatalog, WavetableSet,
    };
    pub use aeolus_midi::{DivisionMask, NoteEvent, NoteInput};
}
