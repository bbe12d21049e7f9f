//! CRC-32 support for SCTE-35 sections.
//!
//! SCTE-35 protects every section with the MPEG-2 CRC-32 (polynomial
//! 0x04C11DB7, initial value 0xFFFFFFFF, no reflection, no final XOR),
//! computed from `table_id` up to, but not including, the CRC field.

use crc::{CRC_32_MPEG_2, Crc};

/// MPEG-2 CRC-32 algorithm instance used for SCTE-35 sections.
pub const MPEG_2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Computes the MPEG-2 CRC-32 of `data`.
pub fn checksum(data: &[u8]) -> u32 {
    MPEG_2.checksum(data)
}

/// Reads the big-endian CRC-32 stored in the last four bytes of `buffer`.
///
/// Returns `None` when the buffer is shorter than four bytes.
pub fn stored_crc(buffer: &[u8]) -> Option<u32> {
    let tail = buffer.len().checked_sub(4).map(|start| &buffer[start..])?;
    Some(u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]))
}

/// Validates the CRC-32 of a complete SCTE-35 message.
///
/// The CRC is taken from the last four bytes of the buffer and compared
/// against the checksum of everything before it.
///
/// # Returns
///
/// * `Some(true)` - the stored CRC matches
/// * `Some(false)` - the stored CRC does not match
/// * `None` - the buffer is too short to hold a CRC
///
/// # Example
///
/// ```rust
/// use scte35_codec::crc::validate_message_crc;
///
/// let message = [
///     0xfc, 0x30, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
///     0xff, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x7a, 0x4f, 0xbf, 0xff,
/// ];
/// assert_eq!(validate_message_crc(&message), Some(true));
/// ```
pub fn validate_message_crc(buffer: &[u8]) -> Option<bool> {
    let declared = stored_crc(buffer)?;
    Some(checksum(&buffer[..buffer.len() - 4]) == declared)
}

#[cfg(test)]
mod tests {
    use super::*;

    // splice_null section with a valid CRC
    const SPLICE_NULL: [u8; 20] = [
        0xfc, 0x30, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xf0, 0x00, 0x00, 0x00,
        0x00, 0x7a, 0x4f, 0xbf, 0xff,
    ];

    #[test]
    fn check_value() {
        // CRC-32/MPEG-2 catalogue check value
        assert_eq!(checksum(b"123456789"), 0x0376_E6E7);
    }

    #[test]
    fn whole_section_checksums_to_zero() {
        assert_eq!(checksum(&SPLICE_NULL), 0);
    }

    #[test]
    fn validates_known_message() {
        assert_eq!(stored_crc(&SPLICE_NULL), Some(0x7a4f_bfff));
        assert_eq!(validate_message_crc(&SPLICE_NULL), Some(true));
    }

    #[test]
    fn single_bit_flip_is_detected() {
        let mut corrupted = SPLICE_NULL;
        corrupted[9] ^= 0x01;
        assert_eq!(validate_message_crc(&corrupted), Some(false));
    }

    #[test]
    fn short_buffer_has_no_crc() {
        assert_eq!(validate_message_crc(&[0x01, 0x02]), None);
    }
}
