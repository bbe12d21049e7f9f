//! Error types for decoding and encoding splice information sections.
//!
//! Decoding errors carry enough context (byte offsets, declared vs. measured
//! values, raw bytes) to diagnose a bad cue without parsing it again.

use crate::section::SpliceInfoSection;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors returned by [`decode`](crate::decode) and [`decode_with`](crate::decode_with).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The buffer ended before a field could be read.
    #[error(
        "truncated input at byte {offset}: need {needed_bits} bits, {available_bits} available"
    )]
    TruncatedInput {
        offset: usize,
        needed_bits: usize,
        available_bits: usize,
    },

    /// The first byte is not the SCTE-35 table id (0xFC).
    #[error("invalid table_id 0x{found:02x}, expected 0xfc")]
    InvalidTableId { found: u8 },

    /// The splice command type is not one this codec understands.
    ///
    /// `raw` holds the command body when its length was declared.
    #[error("unknown splice_command_type 0x{command_type:02x} at byte {offset}")]
    UnknownCommandType {
        command_type: u8,
        offset: usize,
        raw: Vec<u8>,
    },

    /// The trailing CRC-32 does not match the section contents.
    ///
    /// The checksum is verified once the section is framed and before its
    /// body is parsed, so any damaged payload bit lands here. `section`
    /// holds the parsed cue when the damaged body still parses, so callers
    /// can display or accept it.
    #[error("CRC-32 mismatch: computed 0x{computed:08x}, declared 0x{declared:08x}")]
    CrcMismatch {
        computed: u32,
        declared: u32,
        section: Option<Box<SpliceInfoSection>>,
    },

    /// A descriptor could not be delimited, or could not be interpreted in
    /// strict mode.
    #[error("malformed descriptor with tag 0x{tag:02x} at byte {offset}: {issue}")]
    MalformedDescriptor {
        tag: u8,
        offset: usize,
        issue: DescriptorIssue,
        raw: Vec<u8>,
    },

    /// The buffer holds more bytes than `section_length` accounts for.
    #[error("section_length declares {declared} bytes but {actual} bytes follow it")]
    SectionLengthMismatch { declared: usize, actual: usize },

    /// The parsed command body disagrees with `splice_command_length`.
    #[error(
        "splice command 0x{command_type:02x} declares {declared} bytes but its body is {parsed} bytes"
    )]
    CommandLengthMismatch {
        command_type: u8,
        declared: usize,
        parsed: usize,
    },

    /// A field holds a value that makes the rest of the section unreadable.
    #[error("invalid {field} at byte {offset}: {reason}")]
    InvalidField {
        field: &'static str,
        offset: usize,
        reason: String,
    },
}

impl DecodeError {
    /// Recovers the parsed section from a [`DecodeError::CrcMismatch`].
    ///
    /// Returns `None` for every other error kind, and for a mismatch whose
    /// body could not be parsed.
    pub fn into_section(self) -> Option<SpliceInfoSection> {
        match self {
            DecodeError::CrcMismatch { section, .. } => section.map(|section| *section),
            _ => None,
        }
    }

    /// Whether the caller may still accept the cue this error was raised for.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DecodeError::CrcMismatch {
                section: Some(_),
                ..
            } | DecodeError::UnknownCommandType { .. }
        )
    }
}

/// Why a descriptor with a well-known tag was kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DescriptorIssue {
    #[error("identifier 0x{found:08x} is not \"CUEI\"")]
    UnexpectedIdentifier { found: u32 },

    #[error("payload ends at byte {offset}: need {needed_bits} bits, {available_bits} available")]
    Truncated {
        offset: usize,
        needed_bits: usize,
        available_bits: usize,
    },

    #[error("{count} unread bytes after the descriptor body")]
    TrailingBytes { count: usize },

    #[error("{field} holds an unusable value: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("descriptor_length {declared} runs past the descriptor loop ({available} bytes left)")]
    LengthOverrun { declared: usize, available: usize },
}

impl From<DecodeError> for DescriptorIssue {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::TruncatedInput {
                offset,
                needed_bits,
                available_bits,
            } => DescriptorIssue::Truncated {
                offset,
                needed_bits,
                available_bits,
            },
            other => DescriptorIssue::InvalidValue {
                field: "payload".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Errors returned by [`encode`](crate::encode).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A value does not fit in the field it is written to.
    #[error("{field} value {value} exceeds its maximum {max}")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// Two parts of the section contradict each other.
    #[error("inconsistent {field}: {reason}")]
    InconsistentField {
        field: &'static str,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_maps_to_descriptor_issue() {
        let err = DecodeError::TruncatedInput {
            offset: 4,
            needed_bits: 16,
            available_bits: 8,
        };
        assert_eq!(
            DescriptorIssue::from(err),
            DescriptorIssue::Truncated {
                offset: 4,
                needed_bits: 16,
                available_bits: 8,
            }
        );
    }

    #[test]
    fn only_crc_mismatch_yields_section() {
        let err = DecodeError::InvalidTableId { found: 0x00 };
        assert!(!err.is_recoverable());
        assert!(err.into_section().is_none());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let err = DecodeError::InvalidTableId { found: 0x42 };
        assert_eq!(err.to_string(), "invalid table_id 0x42, expected 0xfc");

        let err = EncodeError::FieldOverflow {
            field: "tier",
            value: 0x1000,
            max: 0xfff,
        };
        assert_eq!(err.to_string(), "tier value 4096 exceeds its maximum 4095");
    }
}
