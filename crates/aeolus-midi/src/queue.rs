//! Lock-free note queue from the MIDI ingestion thread to the audio thread.

use crate::error::Result;
use crate::event::{NoteEvent, COMPASS_HIGH, COMPASS_LOW};
use crate::routing::MIDI_CHANNELS;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use tracing::warn;

/// Default capacity; enough for a full panic sweep (16 channels x 61 keys).
pub const DEFAULT_NOTE_CAPACITY: usize = 1024;

/// Velocity used by the panic sweep when switching every key on.
const PANIC_VELOCITY: u8 = 127;

/// Producer half, owned by the MIDI ingestion thread.
pub struct NoteInput {
    producer: HeapProd<NoteEvent>,
}

impl NoteInput {
    /// Push a note event.
    ///
    /// Returns true if the event was queued, false if the queue is full.
    #[inline]
    pub fn push(&mut self, event: NoteEvent) -> bool {
        self.producer.try_push(event).is_ok()
    }

    #[inline]
    pub fn note_on(&mut self, channel: u8, key: u8, velocity: u8) -> bool {
        self.push(NoteEvent::on(channel, key, velocity))
    }

    #[inline]
    pub fn note_off(&mut self, channel: u8, key: u8) -> bool {
        self.push(NoteEvent::off(channel, key))
    }

    /// Parse and queue a raw MIDI message.
    ///
    /// `Ok(false)` means the message carried no key state or the queue was full.
    pub fn push_raw(&mut self, bytes: &[u8]) -> Result<bool> {
        match NoteEvent::from_bytes(bytes)? {
            Some(event) => Ok(self.push(event)),
            None => Ok(false),
        }
    }

    /// Release every compass key on every channel. Returns the number queued.
    pub fn all_notes_off(&mut self) -> usize {
        self.sweep(|channel, key| NoteEvent::off(channel, key))
    }

    /// Press every compass key on every channel. Returns the number queued.
    pub fn all_notes_on(&mut self) -> usize {
        self.sweep(|channel, key| NoteEvent::on(channel, key, PANIC_VELOCITY))
    }

    fn sweep(&mut self, make: impl Fn(u8, u8) -> NoteEvent) -> usize {
        let mut queued = 0;
        for channel in 0..MIDI_CHANNELS as u8 {
            for key in COMPASS_LOW..=COMPASS_HIGH {
                if !self.push(make(channel, key)) {
                    warn!(queued, "Note queue full during panic sweep");
                    return queued;
                }
                queued += 1;
            }
        }
        queued
    }

    #[inline]
    pub fn free_slots(&self) -> usize {
        self.producer.vacant_len()
    }
}

/// Consumer half, drained by the audio thread.
pub struct NoteQueue {
    consumer: HeapCons<NoteEvent>,
}

impl NoteQueue {
    #[inline]
    pub fn pop(&mut self) -> Option<NoteEvent> {
        self.consumer.try_pop()
    }

    /// Pop at most `limit` events, handing each to `f`. Never allocates.
    #[inline]
    pub fn drain_bounded(&mut self, limit: usize, mut f: impl FnMut(NoteEvent)) -> usize {
        let mut count = 0;
        while count < limit {
            match self.consumer.try_pop() {
                Some(event) => {
                    f(event);
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.consumer.is_empty()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.consumer.occupied_len()
    }
}

/// Create a note queue with the default capacity.
pub fn note_queue() -> (NoteInput, NoteQueue) {
    note_queue_with_capacity(DEFAULT_NOTE_CAPACITY)
}

/// Create a note queue with the specified capacity.
pub fn note_queue_with_capacity(capacity: usize) -> (NoteInput, NoteQueue) {
    let rb = HeapRb::new(capacity);
    let (producer, consumer) = rb.split();
    (NoteInput { producer }, NoteQueue { consumer })
}
