//! MIDI subsystem for the Aeolus organ core.
//!
//! Pure types with no audio dependencies:
//!
//! - **Routing**: 4-bit channel-to-division masks read with a single atomic load
//! - **Events**: note on/off parsed from raw MIDI bytes
//! - **Note queue**: lock-free SPSC hand-off from the MIDI thread to the audio thread
//! - **Panic**: all-notes-off / all-notes-on sweeps across the manual compass
//!
//! # Example
//!
//! ```
//! use aeolus_midi::{note_queue, MidiRouteTable, RouteToggle};
//!
//! let routes = MidiRouteTable::new();
//! routes.apply(RouteToggle::new(2, 5, true)?);
//! assert_eq!(routes.mask(5).bits(), 0b0100);
//!
//! let (mut input, mut queue) = note_queue();
//! input.push_raw(&[0x95, 60, 100])?;
//! assert_eq!(queue.pop().map(|e| e.key), Some(60));
//! # Ok::<(), aeolus_midi::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod event;
pub use event::{NoteEvent, NoteKind, COMPASS_HIGH, COMPASS_LOW};

mod keys;
pub use keys::KeySet;

mod queue;
pub use queue::{
    note_queue, note_queue_with_capacity, NoteInput, NoteQueue, DEFAULT_NOTE_CAPACITY,
};

mod routing;
pub use routing::{DivisionMask, MidiRouteTable, RouteToggle, MAX_ROUTED_DIVISIONS, MIDI_CHANNELS};
