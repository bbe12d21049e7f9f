//! Base64 and hexadecimal text forms of a cue.
//!
//! Cues travel as text in manifests (HLS `#EXT-X-DATERANGE`, DASH event
//! streams) and APIs; this module converts between that text and the raw
//! section bytes.

use data_encoding::{BASE64, BASE64_NOPAD, HEXLOWER, HEXLOWER_PERMISSIVE};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Text encoding of a cue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TextFormat {
    /// Hex when the input has a `0x` prefix or only hex digits, base64
    /// otherwise. Encodes as base64.
    ///
    /// Hex wins for text that is valid in both alphabets. A cue's base64
    /// form starts with `/` (from the 0xFC table id), so it never looks
    /// like hex; all-digit text that is not valid hex, such as an odd
    /// number of digits, is retried as base64.
    #[default]
    Auto,
    Base64,
    Hex,
}

impl Display for TextFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TextFormat::Auto => write!(f, "auto"),
            TextFormat::Base64 => write!(f, "base64"),
            TextFormat::Hex => write!(f, "hex"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("empty input")]
    Empty,

    #[error("invalid base64: {0}")]
    Base64(data_encoding::DecodeError),

    #[error("invalid hex: {0}")]
    Hex(data_encoding::DecodeError),
}

/// Decodes base64 or hex text into section bytes.
///
/// Surrounding and embedded whitespace is ignored, as is a `0x` prefix on
/// hex input.
///
/// ```rust
/// use scte35_codec::text::{decode_text, TextFormat};
///
/// let from_base64 = decode_text("/DARAAAAAAAAAP/wAAAAAHpPv/8=", TextFormat::Auto).unwrap();
/// let from_hex = decode_text("0xfc301100000000000000fff0000000007a4fbfff", TextFormat::Auto).unwrap();
/// assert_eq!(from_base64, from_hex);
/// ```
pub fn decode_text(input: &str, format: TextFormat) -> Result<Vec<u8>, TextError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(TextError::Empty);
    }

    match format {
        TextFormat::Hex => decode_hex(&compact),
        TextFormat::Base64 => decode_base64(&compact),
        TextFormat::Auto if has_hex_prefix(&compact) => decode_hex(&compact),
        TextFormat::Auto if compact.bytes().all(|b| b.is_ascii_hexdigit()) => {
            decode_hex(&compact).or_else(|err| decode_base64(&compact).map_err(|_| err))
        }
        TextFormat::Auto => decode_base64(&compact),
    }
}

/// Encodes section bytes as text; [`TextFormat::Auto`] produces base64.
pub fn encode_text(bytes: &[u8], format: TextFormat) -> String {
    match format {
        TextFormat::Hex => HEXLOWER.encode(bytes),
        TextFormat::Auto | TextFormat::Base64 => BASE64.encode(bytes),
    }
}

fn has_hex_prefix(input: &str) -> bool {
    input.starts_with("0x") || input.starts_with("0X")
}

fn decode_hex(input: &str) -> Result<Vec<u8>, TextError> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    HEXLOWER_PERMISSIVE
        .decode(digits.as_bytes())
        .map_err(TextError::Hex)
}

fn decode_base64(input: &str) -> Result<Vec<u8>, TextError> {
    let encoding = if input.len() % 4 == 0 {
        &BASE64
    } else {
        &BASE64_NOPAD
    };
    encoding
        .decode(input.as_bytes())
        .map_err(TextError::Base64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPLICE_NULL: [u8; 20] = [
        0xfc, 0x30, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xf0, 0x00, 0x00, 0x00,
        0x00, 0x7a, 0x4f, 0xbf, 0xff,
    ];

    #[test]
    fn detects_base64() {
        assert_eq!(
            decode_text("/DARAAAAAAAAAP/wAAAAAHpPv/8=", TextFormat::Auto).unwrap(),
            SPLICE_NULL
        );
    }

    #[test]
    fn detects_hex_with_and_without_prefix() {
        let hex = "fc301100000000000000fff0000000007a4fbfff";
        assert_eq!(decode_text(hex, TextFormat::Auto).unwrap(), SPLICE_NULL);
        assert_eq!(
            decode_text(&format!("0X{}", hex.to_uppercase()), TextFormat::Auto).unwrap(),
            SPLICE_NULL
        );
    }

    #[test]
    fn hex_wins_for_text_valid_in_both_alphabets() {
        // "abcd" is two hex bytes and also three base64 bytes
        assert_eq!(decode_text("abcd", TextFormat::Auto).unwrap(), vec![0xab, 0xcd]);
        assert_eq!(
            decode_text("abcd", TextFormat::Base64).unwrap(),
            vec![0x69, 0xb7, 0x1d]
        );
    }

    #[test]
    fn all_hex_digits_fall_back_to_base64() {
        // an odd digit count is not hex, but is unpadded base64
        assert_eq!(decode_text("abc", TextFormat::Auto).unwrap(), vec![0x69, 0xb7]);
        assert!(matches!(
            decode_text("a", TextFormat::Auto),
            Err(TextError::Hex(_))
        ));
    }

    #[test]
    fn ignores_whitespace() {
        assert_eq!(
            decode_text("  /DARAAAAAAAAAP/w\nAAAAAHpPv/8=\n", TextFormat::Base64).unwrap(),
            SPLICE_NULL
        );
    }

    #[test]
    fn accepts_unpadded_base64() {
        assert_eq!(
            decode_text("/DARAAAAAAAAAP/wAAAAAHpPv/8", TextFormat::Base64).unwrap(),
            SPLICE_NULL
        );
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(decode_text("   ", TextFormat::Auto), Err(TextError::Empty));
        assert!(matches!(
            decode_text("not base64!", TextFormat::Auto),
            Err(TextError::Base64(_))
        ));
        assert!(matches!(
            decode_text("0xabc", TextFormat::Auto),
            Err(TextError::Hex(_))
        ));
    }

    #[test]
    fn encodes_both_forms() {
        assert_eq!(
            encode_text(&SPLICE_NULL, TextFormat::Base64),
            "/DARAAAAAAAAAP/wAAAAAHpPv/8="
        );
        assert_eq!(
            encode_text(&SPLICE_NULL, TextFormat::Hex),
            "fc301100000000000000fff0000000007a4fbfff"
        );
    }
}
