//! Fixed-size set of held MIDI keys.

/// 128-bit set of held keys, one bit per MIDI note number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeySet([u64; 2]);

impl KeySet {
    pub const EMPTY: Self = Self([0; 2]);

    #[inline]
    pub fn press(&mut self, key: u8) {
        if key < 128 {
            self.0[(key >> 6) as usize] |= 1u64 << (key & 63);
        }
    }

    #[inline]
    pub fn release(&mut self, key: u8) {
        if key < 128 {
            self.0[(key >> 6) as usize] &= !(1u64 << (key & 63));
        }
    }

    #[inline]
    pub fn contains(&self, key: u8) -> bool {
        key < 128 && self.0[(key >> 6) as usize] & (1u64 << (key & 63)) != 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.0 = [0; 2];
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 2]
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.0[0].count_ones() + self.0[1].count_ones()) as usize
    }

    /// Held keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..128).filter(move |&key| self.contains(key))
    }
}
