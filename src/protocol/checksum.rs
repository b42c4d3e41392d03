//! Fletcher-16 style running checksum

/// Two-byte running checksum.
///
/// `byte1` is the byte sum mod 256; `byte2` is the sum of every intermediate
/// `byte1` value mod 256. Order matters: the same bytes in a different order
/// give a different `byte2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Checksum {
    /// Running byte sum
    pub byte1: u8,
    /// Running sum of `byte1`
    pub byte2: u8,
}

impl Checksum {
    /// Empty checksum (`{0, 0}`)
    #[must_use]
    pub const fn new() -> Self {
        Self { byte1: 0, byte2: 0 }
    }

    /// Compute the checksum of `data` in one call
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let mut sum = Self::new();
        sum.update(data);
        sum
    }

    /// Fold `data` into the running checksum
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.push(byte);
        }
    }

    /// Fold a single byte into the running checksum
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.byte1 = self.byte1.wrapping_add(byte);
        self.byte2 = self.byte2.wrapping_add(self.byte1);
    }

    /// Wire order: `byte1` then `byte2`
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 2] {
        [self.byte1, self.byte2]
    }

    /// Read a checksum from its wire order
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            byte1: bytes[0],
            byte2: bytes[1],
        }
    }

    /// Packed form used in error reports (`byte1 | byte2 << 8`)
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        u16::from_le_bytes(self.to_bytes())
    }
}

/// Compute the checksum of `data`
#[inline]
#[must_use]
pub fn fletcher16(data: &[u8]) -> Checksum {
    Checksum::compute(data)
}
