//! Control → audio command channel.

use crate::model::StopId;
use crate::{Error, Result};
use aeolus_midi::RouteToggle;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

/// Fixed-size command record. Every address it carries has already been
/// validated against the organ topology.
///
/// Retunes never reach the audio thread; they travel on the retune worker's
/// own inbox as [`RetuneRequest`](crate::retune::RetuneRequest) records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ActivateStop(StopId),
    DeactivateStop(StopId),
    ToggleTremulant { division: u8 },
    SetDivisionVolume { division: u8, gain: f32 },
    SetMidiMapping(RouteToggle),
    Shutdown,
}

/// Producer half, owned by the control thread.
pub struct CommandProducer {
    producer: HeapProd<Command>,
}

impl CommandProducer {
    /// Enqueue a command. Fails fast with [`Error::ChannelFull`]; never blocks.
    #[inline]
    pub fn push(&mut self, command: Command) -> Result<()> {
        self.producer
            .try_push(command)
            .map_err(|_| Error::ChannelFull)
    }

    #[inline]
    pub fn free_slots(&self) -> usize {
        self.producer.vacant_len()
    }
}

/// Consumer half, drained by the audio thread.
pub struct CommandConsumer {
    consumer: HeapCons<Command>,
}

impl CommandConsumer {
    #[inline]
    pub fn pop(&mut self) -> Option<Command> {
        self.consumer.try_pop()
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.consumer.is_empty()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.consumer.occupied_len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.consumer.capacity().get()
    }
}

/// Create a command channel with the given capacity.
pub fn command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::new(capacity);
    let (producer, consumer) = rb.split();
    (CommandProducer { producer }, CommandConsumer { consumer })
}
