//! UPID (Unique Program Identifier) types and rendering.
//!
//! A segmentation descriptor names the content it refers to with a typed
//! identifier. The codec keeps the identifier bytes verbatim; this module
//! only classifies them and renders them for display.

use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! upid_types {
    ($($id:literal => $variant:ident, $description:literal;)+) => {
        /// The `segmentation_upid_type` of a segmentation descriptor.
        ///
        /// Unassigned values are kept in [`SegmentationUpidType::Reserved`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(from = "u8", into = "u8"))]
        #[non_exhaustive]
        pub enum SegmentationUpidType {
            $($variant,)+
            Reserved(u8),
        }

        impl From<u8> for SegmentationUpidType {
            fn from(value: u8) -> Self {
                match value {
                    $($id => SegmentationUpidType::$variant,)+
                    other => SegmentationUpidType::Reserved(other),
                }
            }
        }

        impl From<SegmentationUpidType> for u8 {
            fn from(value: SegmentationUpidType) -> Self {
                match value {
                    $(SegmentationUpidType::$variant => $id,)+
                    SegmentationUpidType::Reserved(other) => other,
                }
            }
        }

        impl SegmentationUpidType {
            /// Returns a human-readable description of the UPID type.
            ///
            /// ```rust
            /// use scte35_codec::SegmentationUpidType;
            ///
            /// assert_eq!(SegmentationUpidType::AdID.description(), "Ad Identifier");
            /// ```
            pub fn description(&self) -> &'static str {
                match self {
                    $(SegmentationUpidType::$variant => $description,)+
                    SegmentationUpidType::Reserved(_) => "Reserved",
                }
            }
        }
    };
}

upid_types! {
    0x00 => NotUsed, "Not Used";
    0x01 => UserDefinedDeprecated, "User Defined (Deprecated)";
    0x02 => ISCI, "ISCI (Industry Standard Commercial Identifier)";
    0x03 => AdID, "Ad Identifier";
    0x04 => UMID, "UMID (Unique Material Identifier)";
    0x05 => ISANDeprecated, "ISAN (Deprecated)";
    0x06 => ISAN, "ISAN (International Standard Audiovisual Number)";
    0x07 => TID, "TID (Tribune Media Systems Program Identifier)";
    0x08 => AiringID, "Airing ID";
    0x09 => ADI, "ADI (Advertising Digital Identification)";
    0x0A => EIDR, "EIDR (Entertainment Identifier Registry)";
    0x0B => ATSCContentIdentifier, "ATSC Content Identifier";
    0x0C => MPU, "MPU (Managed Private UPID)";
    0x0D => MID, "MID (Multiple UPID)";
    0x0E => ADSInformation, "ADS Information";
    0x0F => URI, "URI (Uniform Resource Identifier)";
    0x10 => UUID, "UUID (Universally Unique Identifier)";
    0x11 => SCR, "SCR (Subscriber Company Reporting)";
}

impl Default for SegmentationUpidType {
    fn default() -> Self {
        SegmentationUpidType::NotUsed
    }
}

impl Display for SegmentationUpidType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// A `segmentation_upid()`: the identifier type and its raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentationUpid {
    pub upid_type: SegmentationUpidType,
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_serde"))]
    pub value: Vec<u8>,
}

impl SegmentationUpid {
    pub fn new(upid_type: SegmentationUpidType, value: impl Into<Vec<u8>>) -> Self {
        SegmentationUpid {
            upid_type,
            value: value.into(),
        }
    }
}

impl Display for SegmentationUpid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use SegmentationUpidType::*;

        let bytes = self.value.as_slice();
        match self.upid_type {
            _ if bytes.is_empty() => f.write_str("(empty)"),
            UUID => f.write_str(&format_uuid(bytes)),
            ISAN | ISANDeprecated => f.write_str(&format_isan(bytes)),
            ISCI | AdID | TID | ADI | URI | UserDefinedDeprecated | SCR
                if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') =>
            {
                f.write_str(&String::from_utf8_lossy(bytes))
            }
            _ => write!(f, "0x{}", format_hex(bytes)),
        }
    }
}

fn format_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Formats 16 bytes as a hyphenated UUID; other lengths fall back to hex.
pub fn format_uuid(bytes: &[u8]) -> String {
    if bytes.len() != 16 {
        return format_hex(bytes);
    }
    let hex = format_hex(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Formats the first 12 bytes of an ISAN as six hyphenated groups.
pub fn format_isan(bytes: &[u8]) -> String {
    if bytes.len() < 12 {
        return format_hex(bytes);
    }
    bytes[..12]
        .chunks(2)
        .map(format_hex)
        .collect::<Vec<_>>()
        .join("-")
}
