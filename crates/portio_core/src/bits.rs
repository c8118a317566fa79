//!Bit-level addressing within one register byte.
//!
//!Bit 7 is the most significant bit. A range is identified by its start
//!(highest) bit and a length growing toward bit 0, so the only legal lengths
//!for a given start are `1..=start + 1`.

use crate::error::PortError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    start: u8,
    len: u8,
}

impl BitRange {
    ///Validates that the range fits within a single byte. Out-of-range
    ///requests are rejected here, before any hardware access, and are never
    ///clamped.
    pub fn new(start: u8, len: u8) -> Result<Self, PortError> {
        if start > 7 {
            return Err(PortError::config(format!(
                "bit start {} out of range, must be 0-7",
                start
            )));
        }
        if len == 0 || len > start + 1 {
            return Err(PortError::config(format!(
                "bit range length {} invalid for start {}, must be 1-{}",
                len,
                start,
                start + 1
            )));
        }
        Ok(Self { start, len })
    }

    ///A one-bit range at the given position.
    pub fn single(bit: u8) -> Result<Self, PortError> {
        Self::new(bit, 1)
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    ///Distance from bit 0 to the lowest bit of the range.
    pub fn shift(&self) -> u8 {
        self.start + 1 - self.len
    }

    pub fn mask(&self) -> u8 {
        (((1u16 << self.len) - 1) as u8) << self.shift()
    }

    ///Right-aligned value of the range within `byte`. Masking before shifting
    ///keeps neighboring bits out of the result.
    pub fn extract(&self, byte: u8) -> u8 {
        (byte & self.mask()) >> self.shift()
    }

    ///`byte` with the range replaced by `value` (truncated to the range
    ///length); bits outside the range are untouched.
    pub fn insert(&self, byte: u8, value: u8) -> u8 {
        let mask = self.mask();
        (byte & !mask) | ((value << self.shift()) & mask)
    }
}
