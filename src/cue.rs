//! Entry points: decode a cue from bytes, encode one back.

use crate::error::{DecodeResult, EncodeResult};
use crate::section::SpliceInfoSection;

/// Decoder settings.
///
/// ```rust
/// use scte35_codec::DecodeOptions;
///
/// let options = DecodeOptions::default()
///     .verify_crc(false)
///     .strict_descriptors(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    verify_crc: bool,
    strict_descriptors: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            verify_crc: true,
            strict_descriptors: false,
        }
    }
}

impl DecodeOptions {
    /// Whether a CRC mismatch fails the decode. On by default.
    pub fn verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }

    /// Whether a descriptor that cannot be interpreted fails the decode
    /// instead of being kept as raw bytes. Off by default.
    pub fn strict_descriptors(mut self, strict: bool) -> Self {
        self.strict_descriptors = strict;
        self
    }

    pub(crate) fn verifies_crc(&self) -> bool {
        self.verify_crc
    }

    pub(crate) fn strict(&self) -> bool {
        self.strict_descriptors
    }
}

/// Decodes a complete `splice_info_section` with the default options.
///
/// The buffer must hold exactly one section: from `table_id` through the
/// trailing CRC-32.
///
/// # Example
///
/// ```rust
/// use scte35_codec::{decode, SpliceCommand};
///
/// let bytes = [
///     0xfc, 0x30, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
///     0xff, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x7a, 0x4f, 0xbf, 0xff,
/// ];
/// let section = decode(&bytes).unwrap();
/// assert_eq!(section.splice_command, SpliceCommand::SpliceNull);
/// ```
pub fn decode(bytes: &[u8]) -> DecodeResult<SpliceInfoSection> {
    decode_with(bytes, &DecodeOptions::default())
}

pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> DecodeResult<SpliceInfoSection> {
    SpliceInfoSection::from_bytes(bytes, options)
}

/// Encodes a section to bytes.
///
/// `section_length`, `splice_command_length`, `descriptor_loop_length` and
/// the CRC-32 are computed from the encoded content; the values stored in
/// `section` are ignored, except that a `splice_command_length` of 0xFFF is
/// written back as the sentinel.
pub fn encode(section: &SpliceInfoSection) -> EncodeResult<Vec<u8>> {
    section.to_bytes()
}
