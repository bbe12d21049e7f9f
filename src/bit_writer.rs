//! Bit-level write cursor, the encoding counterpart of
//! [`BitReader`](crate::BitReader).

use crate::error::{EncodeError, EncodeResult};

/// A write cursor that appends values of arbitrary bit width, MSB first.
///
/// The buffer grows as bits are written and the final partial byte is
/// zero-padded. Values that do not fit in their field width are rejected
/// with [`EncodeError::FieldOverflow`] rather than truncated.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    buffer: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        BitWriter {
            buffer: Vec::with_capacity(bytes),
            bit_len: 0,
        }
    }

    /// Writes the low `bits` bits of `value`.
    pub fn write_bits(&mut self, value: u64, bits: u32) -> EncodeResult<()> {
        self.write_field("value", value, bits)
    }

    /// Writes `value` into a field of `bits` bits, naming the field in the
    /// error if it does not fit.
    pub fn write_field(&mut self, field: &'static str, value: u64, bits: u32) -> EncodeResult<()> {
        debug_assert!(bits <= 64, "a single write is limited to 64 bits");
        let bits = bits.min(64);
        let max = match bits {
            64 => u64::MAX,
            n => (1u64 << n) - 1,
        };
        if value > max {
            return Err(EncodeError::FieldOverflow { field, value, max });
        }

        for shift in (0..bits).rev() {
            if self.bit_len % 8 == 0 {
                self.buffer.push(0);
            }
            if (value >> shift) & 1 == 1 {
                let last = self.buffer.len() - 1;
                self.buffer[last] |= 0x80 >> (self.bit_len % 8);
            }
            self.bit_len += 1;
        }
        Ok(())
    }

    pub fn write_bool(&mut self, bit: bool) -> EncodeResult<()> {
        self.write_bits(u64::from(bit), 1)
    }

    /// Writes `bits` reserved bits, all set to one.
    pub fn write_reserved(&mut self, bits: u32) -> EncodeResult<()> {
        for _ in 0..bits {
            self.write_bool(true)?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> EncodeResult<()> {
        if self.is_byte_aligned() {
            self.buffer.extend_from_slice(bytes);
            self.bit_len += bytes.len() * 8;
            return Ok(());
        }
        for &byte in bytes {
            self.write_bits(u64::from(byte), 8)?;
        }
        Ok(())
    }

    /// Number of bytes written so far, counting a partial final byte.
    pub fn byte_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.bit_len % 8 == 0
    }

    /// Returns the written bytes; a partial final byte is zero-padded.
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

/// Types that serialize themselves into a [`BitWriter`].
pub trait Encodable {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()>;

    /// Encodes into a fresh, byte-padded buffer.
    fn encode_to_vec(&self) -> EncodeResult<Vec<u8>> {
        let mut writer = BitWriter::new();
        self.encode(&mut writer)?;
        Ok(writer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_fields_across_bytes() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(0b11001, 5).unwrap();
        writer.write_bits(0b0110, 4).unwrap();
        writer.write_bits(0b1111, 4).unwrap();
        assert_eq!(writer.finish(), vec![0b1011_1001, 0b0110_1111]);
    }

    #[test]
    fn pads_final_byte_with_zeros() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b10110, 5).unwrap();
        assert_eq!(writer.byte_len(), 1);
        assert_eq!(writer.bit_len(), 5);
        assert_eq!(writer.finish(), vec![0b1011_0000]);
    }

    #[test]
    fn reserved_bits_are_ones() {
        let mut writer = BitWriter::new();
        writer.write_bool(false).unwrap();
        writer.write_reserved(7).unwrap();
        assert_eq!(writer.finish(), vec![0x7F]);
    }

    #[test]
    fn writes_33_bit_pts() {
        let mut writer = BitWriter::new();
        writer.write_bool(true).unwrap();
        writer.write_reserved(6).unwrap();
        writer.write_field("pts_time", 0x0_72BD_0050, 33).unwrap();
        assert_eq!(writer.finish(), vec![0xFE, 0x72, 0xBD, 0x00, 0x50]);
    }

    #[test]
    fn unaligned_bytes() {
        let mut writer = BitWriter::new();
        writer.write_bits(0x0, 4).unwrap();
        writer.write_bytes(&[0xAB, 0xCD]).unwrap();
        assert_eq!(writer.finish(), vec![0x0A, 0xBC, 0xD0]);
    }

    #[test]
    fn overflow_is_rejected_not_truncated() {
        let mut writer = BitWriter::new();
        let err = writer.write_field("tier", 0x1000, 12).unwrap_err();
        assert_eq!(
            err,
            EncodeError::FieldOverflow {
                field: "tier",
                value: 0x1000,
                max: 0xFFF,
            }
        );
        assert!(writer.finish().is_empty());
    }

    #[test]
    fn full_width_values() {
        let mut writer = BitWriter::new();
        writer.write_bits(u64::MAX, 64).unwrap();
        assert_eq!(writer.finish(), vec![0xFF; 8]);
    }
}
