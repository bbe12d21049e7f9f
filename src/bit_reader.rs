//! Bit-level read cursor.
//!
//! SCTE-35 packs fields at arbitrary bit boundaries, so the reader keeps a
//! bit position over a borrowed byte slice and checks bounds on every read.

use crate::error::{DecodeError, DecodeResult};

/// A read cursor over a byte buffer with sub-byte granularity.
///
/// Values are read most-significant bit first. The reader never reads past
/// the end of its buffer: a short read fails with
/// [`DecodeError::TruncatedInput`] and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buffer: &'a [u8],
    position: usize,
    base: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_base(buffer, 0)
    }

    /// Creates a reader whose error offsets are reported relative to `base`.
    ///
    /// Used for payloads sliced out of a larger section, so that a
    /// truncation inside a descriptor still names its position in the cue.
    pub fn with_base(buffer: &'a [u8], base: usize) -> Self {
        BitReader {
            buffer,
            position: 0,
            base,
        }
    }

    /// Reads `bits` bits (at most 64) as an unsigned integer, MSB first.
    pub fn read_bits(&mut self, bits: u32) -> DecodeResult<u64> {
        debug_assert!(bits <= 64, "a single read is limited to 64 bits");
        let bits = bits.min(64) as usize;
        self.ensure(bits)?;

        let mut value = 0u64;
        let mut left = bits;
        while left > 0 {
            let byte = self.buffer[self.position / 8];
            let used = self.position % 8;
            let take = left.min(8 - used);
            let chunk = (byte >> (8 - used - take)) & (0xFF >> (8 - take));
            value = (value << take) | u64::from(chunk);
            self.position += take;
            left -= take;
        }
        Ok(value)
    }

    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Reads `count` whole bytes, whether or not the cursor is byte-aligned.
    pub fn read_bytes(&mut self, count: usize) -> DecodeResult<Vec<u8>> {
        self.ensure(count * 8)?;
        if self.is_byte_aligned() {
            let start = self.position / 8;
            self.position += count * 8;
            return Ok(self.buffer[start..start + count].to_vec());
        }
        (0..count).map(|_| self.read_u8()).collect()
    }

    /// Advances past `bits` bits without interpreting them.
    pub fn skip_bits(&mut self, bits: usize) -> DecodeResult<()> {
        self.ensure(bits)?;
        self.position += bits;
        Ok(())
    }

    /// Reads `bits` reserved bits, which must all be set to one.
    ///
    /// Reserved bits are not modelled, so any other value could not be
    /// written back and fails with [`DecodeError::InvalidField`].
    pub fn read_reserved(&mut self, bits: u32) -> DecodeResult<()> {
        let offset = self.byte_offset();
        let value = self.read_bits(bits)?;
        let expected = match bits {
            64 => u64::MAX,
            n => (1u64 << n) - 1,
        };
        if value != expected {
            return Err(DecodeError::InvalidField {
                field: "reserved",
                offset,
                reason: format!("{bits} reserved bits hold {value:#b}, expected all ones"),
            });
        }
        Ok(())
    }

    pub fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.position
    }

    pub fn remaining_bytes(&self) -> usize {
        self.remaining_bits() / 8
    }

    pub fn bit_offset(&self) -> usize {
        self.position
    }

    /// Absolute byte offset of the cursor, including the reader's base.
    pub fn byte_offset(&self) -> usize {
        self.base + self.position / 8
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.position % 8 == 0
    }

    fn ensure(&self, bits: usize) -> DecodeResult<()> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(DecodeError::TruncatedInput {
                offset: self.byte_offset(),
                needed_bits: bits,
                available_bits: available,
            });
        }
        Ok(())
    }
}
