//! Channel-to-division routing masks.
//!
//! Each MIDI channel owns a 4-bit mask; bit `n` routes the channel's notes to
//! division `n`. The table is shared between threads: the audio-side dispatcher
//! is the only writer, and every read is a single atomic load.
//!
//! ```text
//! channel  0  [0b0001] -> division 0
//! channel  5  [0b0101] -> divisions 0, 2
//! channel 15  [0b0000] -> (unrouted)
//! ```
//!
//! # RT Safety
//!
//! [`MidiRouteTable::apply`] and [`MidiRouteTable::mask`] are wait-free and never
//! allocate. Range validation happens when a [`RouteToggle`] is built, so the
//! audio thread only ever sees toggles that fit the mask width.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Number of MIDI channels addressable by the routing table.
pub const MIDI_CHANNELS: usize = 16;

/// Width of a routing mask; at most this many divisions per channel.
pub const MAX_ROUTED_DIVISIONS: u8 = 4;

const MASK_BITS: u8 = (1 << MAX_ROUTED_DIVISIONS) - 1;

/// A set of up to four divisions, stored as a 4-bit field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DivisionMask(u8);

impl DivisionMask {
    pub const EMPTY: Self = Self(0);

    /// Build a mask from raw bits. Bits above the mask width are rejected.
    pub fn from_bits(bits: u8) -> Result<Self> {
        if bits & !MASK_BITS != 0 {
            // Report the lowest division that does not fit.
            let overflow = (bits & !MASK_BITS).trailing_zeros() as u8;
            return Err(Error::DivisionOutOfRange(overflow));
        }
        Ok(Self(bits))
    }

    /// Mask holding a single division.
    pub fn single(division: u8) -> Result<Self> {
        Self::EMPTY.with(division)
    }

    /// Copy of this mask with `division` added.
    pub fn with(self, division: u8) -> Result<Self> {
        check_division(division)?;
        Ok(Self(self.0 | (1 << division)))
    }

    /// Copy of this mask with `division` removed.
    pub fn without(self, division: u8) -> Result<Self> {
        check_division(division)?;
        Ok(Self(self.0 & !(1 << division)))
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Out-of-range divisions are simply reported as not routed.
    #[inline]
    pub fn contains(self, division: u8) -> bool {
        division < MAX_ROUTED_DIVISIONS && self.0 & (1 << division) != 0
    }

    /// Iterate routed division indices in ascending order.
    pub fn divisions(self) -> impl Iterator<Item = u8> {
        (0..MAX_ROUTED_DIVISIONS).filter(move |&d| self.0 & (1 << d) != 0)
    }
}

impl TryFrom<u8> for DivisionMask {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl From<DivisionMask> for u8 {
    fn from(mask: DivisionMask) -> u8 {
        mask.0
    }
}

fn check_division(division: u8) -> Result<()> {
    if division >= MAX_ROUTED_DIVISIONS {
        return Err(Error::DivisionOutOfRange(division));
    }
    Ok(())
}

fn check_channel(channel: u8) -> Result<()> {
    if channel as usize >= MIDI_CHANNELS {
        return Err(Error::ChannelOutOfRange(channel));
    }
    Ok(())
}

/// A validated request to set or clear one routing bit.
///
/// Construction is the only place ranges are checked; a `RouteToggle` that
/// exists always addresses a representable bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteToggle {
    division: u8,
    channel: u8,
    enabled: bool,
}

impl RouteToggle {
    pub fn new(division: u8, channel: u8, enabled: bool) -> Result<Self> {
        check_division(division)?;
        check_channel(channel)?;
        Ok(Self {
            division,
            channel,
            enabled,
        })
    }

    #[inline]
    pub fn division(&self) -> u8 {
        self.division
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Routing table for all sixteen channels.
#[derive(Debug, Default)]
pub struct MidiRouteTable {
    masks: [AtomicU8; MIDI_CHANNELS],
}

impl MidiRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded from an initial `(channel, mask)` list.
    pub fn with_routes(routes: &[(u8, DivisionMask)]) -> Result<Self> {
        let table = Self::new();
        for &(channel, mask) in routes {
            check_channel(channel)?;
            table.masks[channel as usize].fetch_or(mask.bits(), Ordering::Release);
        }
        Ok(table)
    }

    /// Current mask for `channel`. Out-of-range channels read as empty.
    #[inline]
    pub fn mask(&self, channel: u8) -> DivisionMask {
        match self.masks.get(channel as usize) {
            Some(mask) => DivisionMask(mask.load(Ordering::Acquire) & MASK_BITS),
            None => DivisionMask::EMPTY,
        }
    }

    /// Set or clear a single bit, leaving the rest of the mask untouched.
    ///
    /// Returns the mask after the update.
    #[inline]
    pub fn apply(&self, toggle: RouteToggle) -> DivisionMask {
        let bit = 1u8 << toggle.division;
        let slot = &self.masks[toggle.channel as usize];
        let previous = if toggle.enabled {
            slot.fetch_or(bit, Ordering::AcqRel)
        } else {
            slot.fetch_and(!bit, Ordering::AcqRel)
        };
        let current = if toggle.enabled {
            previous | bit
        } else {
            previous & !bit
        };
        DivisionMask(current & MASK_BITS)
    }
}
