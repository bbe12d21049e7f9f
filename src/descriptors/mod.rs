//! Splice descriptors: tagged annotations following the splice command.
//!
//! Every descriptor is `tag (8) | length (8) | payload`. The payload is
//! sliced out by its declared length before it is interpreted, so a
//! descriptor this codec cannot read never shifts the ones after it.

mod segmentation;

pub use segmentation::*;

use crate::bit_reader::BitReader;
use crate::bit_writer::{BitWriter, Encodable};
use crate::error::{DecodeError, DecodeResult, DescriptorIssue, EncodeError, EncodeResult};
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The "CUEI" identifier carried by every SCTE-35 defined descriptor.
pub const CUEI_IDENTIFIER: u32 = 0x4355_4549;

/// Tags of the descriptors defined by SCTE-35.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpliceDescriptorTag {
    Avail,
    Dtmf,
    Segmentation,
    Time,
    Audio,
    Private(u8),
}

impl From<u8> for SpliceDescriptorTag {
    fn from(value: u8) -> Self {
        match value {
            0x00 => SpliceDescriptorTag::Avail,
            0x01 => SpliceDescriptorTag::Dtmf,
            0x02 => SpliceDescriptorTag::Segmentation,
            0x03 => SpliceDescriptorTag::Time,
            0x04 => SpliceDescriptorTag::Audio,
            other => SpliceDescriptorTag::Private(other),
        }
    }
}

impl From<SpliceDescriptorTag> for u8 {
    fn from(value: SpliceDescriptorTag) -> Self {
        match value {
            SpliceDescriptorTag::Avail => 0x00,
            SpliceDescriptorTag::Dtmf => 0x01,
            SpliceDescriptorTag::Segmentation => 0x02,
            SpliceDescriptorTag::Time => 0x03,
            SpliceDescriptorTag::Audio => 0x04,
            SpliceDescriptorTag::Private(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum SpliceDescriptor {
    Avail {
        provider_avail_id: u32,
    },
    Dtmf {
        /// Tenths of a second between the cue and the DTMF tones.
        preroll: u8,
        dtmf_chars: String,
    },
    Segmentation(SegmentationDescriptor),
    Time {
        tai_seconds: u64,
        tai_ns: u32,
        utc_offset: u16,
    },
    Audio {
        components: Vec<AudioComponent>,
    },
    /// A descriptor with a tag outside the SCTE-35 range, kept verbatim.
    Private(PrivateDescriptor),
    /// A SCTE-35 descriptor whose payload could not be interpreted.
    Unparsed(UnparsedDescriptor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioComponent {
    pub component_tag: u8,
    /// ISO 639-2 language code, three ASCII letters.
    pub iso_code: String,
    pub bit_stream_mode: u8,
    pub num_channels: u8,
    pub full_srvc_audio: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrivateDescriptor {
    pub tag: u8,
    /// The whole payload, identifier included.
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_serde"))]
    pub data: Vec<u8>,
}

impl PrivateDescriptor {
    /// The leading 32-bit identifier, when the payload is long enough.
    pub fn identifier(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(..4)?.try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnparsedDescriptor {
    pub tag: u8,
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_serde"))]
    pub data: Vec<u8>,
    pub issue: DescriptorIssue,
}

impl SpliceDescriptor {
    pub fn tag(&self) -> u8 {
        match self {
            SpliceDescriptor::Avail { .. } => SpliceDescriptorTag::Avail.into(),
            SpliceDescriptor::Dtmf { .. } => SpliceDescriptorTag::Dtmf.into(),
            SpliceDescriptor::Segmentation(_) => SpliceDescriptorTag::Segmentation.into(),
            SpliceDescriptor::Time { .. } => SpliceDescriptorTag::Time.into(),
            SpliceDescriptor::Audio { .. } => SpliceDescriptorTag::Audio.into(),
            SpliceDescriptor::Private(private) => private.tag,
            SpliceDescriptor::Unparsed(unparsed) => unparsed.tag,
        }
    }

    /// Reads one descriptor from a reader positioned on its tag.
    ///
    /// The reader is expected to span exactly the rest of the descriptor
    /// loop. Only structural damage (a length running past the loop) is an
    /// error; payload problems yield [`SpliceDescriptor::Unparsed`].
    pub(crate) fn read_from(reader: &mut BitReader) -> DecodeResult<Self> {
        let offset = reader.byte_offset();
        if reader.remaining_bytes() < 2 {
            let raw = reader.read_bytes(reader.remaining_bytes())?;
            return Err(DecodeError::MalformedDescriptor {
                tag: raw.first().copied().unwrap_or_default(),
                offset,
                issue: DescriptorIssue::Truncated {
                    offset,
                    needed_bits: 16,
                    available_bits: raw.len() * 8,
                },
                raw,
            });
        }

        let tag = reader.read_u8()?;
        let length = reader.read_u8()? as usize;
        let available = reader.remaining_bytes();
        if length > available {
            let raw = reader.read_bytes(available)?;
            return Err(DecodeError::MalformedDescriptor {
                tag,
                offset,
                issue: DescriptorIssue::LengthOverrun {
                    declared: length,
                    available,
                },
                raw,
            });
        }
        let data = reader.read_bytes(length)?;

        debug!("descriptor tag 0x{tag:02x}, {length} bytes at byte {offset}");
        Ok(Self::interpret(tag, data, offset + 2))
    }

    fn interpret(tag: u8, data: Vec<u8>, payload_offset: usize) -> Self {
        if let SpliceDescriptorTag::Private(tag) = SpliceDescriptorTag::from(tag) {
            return SpliceDescriptor::Private(PrivateDescriptor { tag, data });
        }

        let mut reader = BitReader::with_base(&data, payload_offset);
        let parsed = Self::read_payload(tag, &mut reader).and_then(|descriptor| {
            match reader.remaining_bytes() {
                0 => Ok(descriptor),
                count => Err(DescriptorIssue::TrailingBytes { count }),
            }
        });

        match parsed {
            Ok(descriptor) => descriptor,
            Err(issue) => {
                warn!("keeping descriptor 0x{tag:02x} as raw bytes: {issue}");
                SpliceDescriptor::Unparsed(UnparsedDescriptor { tag, data, issue })
            }
        }
    }

    fn read_payload(tag: u8, reader: &mut BitReader) -> Result<Self, DescriptorIssue> {
        let identifier = reader.read_u32()?;
        if identifier != CUEI_IDENTIFIER {
            return Err(DescriptorIssue::UnexpectedIdentifier { found: identifier });
        }

        let descriptor = match SpliceDescriptorTag::from(tag) {
            SpliceDescriptorTag::Avail => SpliceDescriptor::Avail {
                provider_avail_id: reader.read_u32()?,
            },
            SpliceDescriptorTag::Dtmf => {
                let preroll = reader.read_u8()?;
                let dtmf_count = reader.read_bits(3)? as usize;
                reader.read_reserved(5)?;
                let chars = reader.read_bytes(dtmf_count)?;
                SpliceDescriptor::Dtmf {
                    preroll,
                    dtmf_chars: ascii_field("dtmf_chars", chars)?,
                }
            }
            SpliceDescriptorTag::Segmentation => {
                SpliceDescriptor::Segmentation(SegmentationDescriptor::read_from(reader)?)
            }
            SpliceDescriptorTag::Time => SpliceDescriptor::Time {
                tai_seconds: reader.read_bits(48)?,
                tai_ns: reader.read_u32()?,
                utc_offset: reader.read_u16()?,
            },
            SpliceDescriptorTag::Audio => {
                let audio_count = reader.read_bits(4)?;
                reader.read_reserved(4)?;
                let mut components = Vec::with_capacity(audio_count as usize);
                for _ in 0..audio_count {
                    let component_tag = reader.read_u8()?;
                    let iso_code = ascii_field("iso_code", reader.read_bytes(3)?)?;
                    components.push(AudioComponent {
                        component_tag,
                        iso_code,
                        bit_stream_mode: reader.read_bits(3)? as u8,
                        num_channels: reader.read_bits(4)? as u8,
                        full_srvc_audio: reader.read_bool()?,
                    });
                }
                SpliceDescriptor::Audio { components }
            }
            SpliceDescriptorTag::Private(tag) => {
                return Err(DescriptorIssue::InvalidValue {
                    field: "splice_descriptor_tag".to_string(),
                    reason: format!("0x{tag:02x} has no SCTE-35 payload layout"),
                });
            }
        };
        Ok(descriptor)
    }

    /// Writes the payload that follows the tag and length bytes.
    fn encode_payload(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        match self {
            SpliceDescriptor::Private(PrivateDescriptor { data, .. })
            | SpliceDescriptor::Unparsed(UnparsedDescriptor { data, .. }) => {
                return writer.write_bytes(data);
            }
            _ => writer.write_bits(u64::from(CUEI_IDENTIFIER), 32)?,
        }

        match self {
            SpliceDescriptor::Avail { provider_avail_id } => {
                writer.write_bits(u64::from(*provider_avail_id), 32)
            }
            SpliceDescriptor::Dtmf {
                preroll,
                dtmf_chars,
            } => {
                check_ascii("dtmf_chars", dtmf_chars)?;
                writer.write_bits(u64::from(*preroll), 8)?;
                writer.write_field("dtmf_count", dtmf_chars.len() as u64, 3)?;
                writer.write_reserved(5)?;
                writer.write_bytes(dtmf_chars.as_bytes())
            }
            SpliceDescriptor::Segmentation(segmentation) => segmentation.encode(writer),
            SpliceDescriptor::Time {
                tai_seconds,
                tai_ns,
                utc_offset,
            } => {
                writer.write_field("tai_seconds", *tai_seconds, 48)?;
                writer.write_bits(u64::from(*tai_ns), 32)?;
                writer.write_bits(u64::from(*utc_offset), 16)
            }
            SpliceDescriptor::Audio { components } => {
                writer.write_field("audio_count", components.len() as u64, 4)?;
                writer.write_reserved(4)?;
                for component in components {
                    check_ascii("iso_code", &component.iso_code)?;
                    if component.iso_code.len() != 3 {
                        return Err(EncodeError::InconsistentField {
                            field: "iso_code",
                            reason: "a language code is exactly three characters",
                        });
                    }
                    writer.write_bits(u64::from(component.component_tag), 8)?;
                    writer.write_bytes(component.iso_code.as_bytes())?;
                    writer.write_field("bit_stream_mode", u64::from(component.bit_stream_mode), 3)?;
                    writer.write_field("num_channels", u64::from(component.num_channels), 4)?;
                    writer.write_bool(component.full_srvc_audio)?;
                }
                Ok(())
            }
            SpliceDescriptor::Private(_) | SpliceDescriptor::Unparsed(_) => Ok(()),
        }
    }
}

impl Encodable for SpliceDescriptor {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        let mut payload = BitWriter::new();
        self.encode_payload(&mut payload)?;
        let payload = payload.finish();

        writer.write_bits(u64::from(self.tag()), 8)?;
        writer.write_field("descriptor_length", payload.len() as u64, 8)?;
        writer.write_bytes(&payload)
    }
}

fn ascii_field(field: &str, bytes: Vec<u8>) -> Result<String, DescriptorIssue> {
    if !bytes.is_ascii() {
        return Err(DescriptorIssue::InvalidValue {
            field: field.to_string(),
            reason: "not ASCII".to_string(),
        });
    }
    String::from_utf8(bytes).map_err(|err| DescriptorIssue::InvalidValue {
        field: field.to_string(),
        reason: err.to_string(),
    })
}

fn check_ascii(field: &'static str, value: &str) -> EncodeResult<()> {
    if value.is_ascii() {
        Ok(())
    } else {
        Err(EncodeError::InconsistentField {
            field,
            reason: "only ASCII characters can be encoded",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(bytes: &[u8]) -> DecodeResult<Vec<SpliceDescriptor>> {
        let mut reader = BitReader::new(bytes);
        let mut descriptors = Vec::new();
        while reader.remaining_bytes() > 0 {
            descriptors.push(SpliceDescriptor::read_from(&mut reader)?);
        }
        Ok(descriptors)
    }

    #[test]
    fn avail_descriptor() {
        let bytes = [0x00, 0x08, 0x43, 0x55, 0x45, 0x49, 0x00, 0x00, 0x01, 0x35];
        let descriptors = read_all(&bytes).unwrap();
        assert_eq!(
            descriptors,
            vec![SpliceDescriptor::Avail {
                provider_avail_id: 0x135,
            }]
        );
        assert_eq!(descriptors[0].encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn dtmf_descriptor() {
        let bytes = [
            0x01, 0x0a, 0x43, 0x55, 0x45, 0x49, 0x32, 0x9f, 0x31, 0x32, 0x33, 0x23,
        ];
        let descriptor = &read_all(&bytes).unwrap()[0];
        assert_eq!(
            descriptor,
            &SpliceDescriptor::Dtmf {
                preroll: 50,
                dtmf_chars: "123#".to_string(),
            }
        );
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn time_descriptor() {
        let bytes = [
            0x03, 0x10, 0x43, 0x55, 0x45, 0x49, 0x00, 0x00, 0x65, 0x5d, 0x27, 0x80, 0x00, 0x00,
            0x03, 0xe8, 0x00, 0x25,
        ];
        let descriptor = &read_all(&bytes).unwrap()[0];
        assert_eq!(
            descriptor,
            &SpliceDescriptor::Time {
                tai_seconds: 0x655d_2780,
                tai_ns: 1000,
                utc_offset: 37,
            }
        );
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn audio_descriptor() {
        let bytes = [
            0x04, 0x0a, 0x43, 0x55, 0x45, 0x49, 0x1f, 0x05, 0x65, 0x6e, 0x67, 0x05,
        ];
        let descriptor = &read_all(&bytes).unwrap()[0];
        assert_eq!(
            descriptor,
            &SpliceDescriptor::Audio {
                components: vec![AudioComponent {
                    component_tag: 5,
                    iso_code: "eng".to_string(),
                    bit_stream_mode: 0,
                    num_channels: 2,
                    full_srvc_audio: true,
                }],
            }
        );
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn unknown_tag_does_not_desynchronize_the_loop() {
        let bytes = [
            0xf0, 0x03, 0xaa, 0xbb, 0xcc, // private descriptor
            0x00, 0x08, 0x43, 0x55, 0x45, 0x49, 0x00, 0x00, 0x00, 0x07,
        ];
        let descriptors = read_all(&bytes).unwrap();
        assert_eq!(
            descriptors,
            vec![
                SpliceDescriptor::Private(PrivateDescriptor {
                    tag: 0xf0,
                    data: vec![0xaa, 0xbb, 0xcc],
                }),
                SpliceDescriptor::Avail {
                    provider_avail_id: 7,
                },
            ]
        );
    }

    #[test]
    fn wrong_identifier_is_kept_raw() {
        let bytes = [0x00, 0x08, 0x41, 0x42, 0x43, 0x44, 0x00, 0x00, 0x00, 0x07];
        let descriptor = &read_all(&bytes).unwrap()[0];
        let SpliceDescriptor::Unparsed(unparsed) = descriptor else {
            panic!("expected an unparsed descriptor, got {descriptor:?}");
        };
        assert_eq!(
            unparsed.issue,
            DescriptorIssue::UnexpectedIdentifier { found: 0x4142_4344 }
        );
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn trailing_bytes_are_an_issue() {
        let bytes = [
            0x00, 0x09, 0x43, 0x55, 0x45, 0x49, 0x00, 0x00, 0x00, 0x07, 0xff,
        ];
        let descriptor = &read_all(&bytes).unwrap()[0];
        assert!(matches!(
            descriptor,
            SpliceDescriptor::Unparsed(UnparsedDescriptor {
                issue: DescriptorIssue::TrailingBytes { count: 1 },
                ..
            })
        ));
    }

    #[test]
    fn lone_tag_byte_is_malformed() {
        let err = read_all(&[0x02]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedDescriptor {
                tag: 0x02,
                issue: DescriptorIssue::Truncated { .. },
                ..
            }
        ));
    }

    #[test]
    fn length_past_loop_is_malformed() {
        let bytes = [0x00, 0x20, 0x43, 0x55, 0x45, 0x49];
        let err = read_all(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedDescriptor {
                tag: 0x00,
                offset: 0,
                issue: DescriptorIssue::LengthOverrun {
                    declared: 0x20,
                    available: 4,
                },
                raw: vec![0x43, 0x55, 0x45, 0x49],
            }
        );
    }

    #[test]
    fn dtmf_longer_than_seven_chars_overflows() {
        let descriptor = SpliceDescriptor::Dtmf {
            preroll: 0,
            dtmf_chars: "12345678".to_string(),
        };
        assert!(matches!(
            descriptor.encode_to_vec(),
            Err(EncodeError::FieldOverflow {
                field: "dtmf_count",
                ..
            })
        ));
    }

    #[test]
    fn private_identifier() {
        let private = PrivateDescriptor {
            tag: 0xf0,
            data: vec![0x41, 0x42, 0x43, 0x44, 0x01],
        };
        assert_eq!(private.identifier(), Some(0x4142_4344));
        assert_eq!(
            PrivateDescriptor {
                tag: 0xf0,
                data: vec![0x01],
            }
            .identifier(),
            None
        );
    }
}
