//! The `splice_info_section`: header, command, descriptor loop and CRC.

use crate::bit_reader::BitReader;
use crate::bit_writer::{BitWriter, Encodable};
use crate::commands::{EncryptedCommand, SpliceCommand, SpliceCommandType};
use crate::crc;
use crate::cue::DecodeOptions;
use crate::descriptors::{SpliceDescriptor, UnparsedDescriptor};
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use log::{debug, trace, warn};
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `table_id` of every SCTE-35 section.
pub const TABLE_ID: u8 = 0xFC;

/// Largest value `section_length` may hold.
pub const MAX_SECTION_LENGTH: u16 = 4093;

/// `splice_command_length` value telling the decoder to size the command
/// from its content.
pub const COMMAND_LENGTH_SENTINEL: u16 = 0xFFF;

/// Bytes from `table_id` through `splice_command_length`.
const HEADER_LEN: usize = 13;

/// A decoded SCTE-35 cue.
///
/// `section_length`, `splice_command_length` and `crc32` describe the bytes
/// this section was decoded from. Encoding recomputes them; call
/// [`SpliceInfoSection::seal`] to bring them up to date on a section built
/// by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpliceInfoSection {
    pub table_id: u8,
    pub section_syntax_indicator: bool,
    pub private_indicator: bool,
    pub sap_type: SAPType,
    pub section_length: u16,
    pub protocol_version: u8,
    pub encrypted_packet: bool,
    pub encryption_algorithm: EncryptionAlgorithm,
    pub pts_adjustment: u64,
    pub cw_index: u8,
    pub tier: u16,
    pub splice_command_length: u16,
    pub splice_command: SpliceCommand,
    pub descriptors: Vec<SpliceDescriptor>,
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_serde"))]
    pub alignment_stuffing: Vec<u8>,
    pub e_crc32: Option<u32>,
    pub crc32: u32,
}

impl SpliceInfoSection {
    /// An unencrypted section carrying `command`, with no descriptors.
    pub fn new(command: SpliceCommand) -> Self {
        SpliceInfoSection {
            table_id: TABLE_ID,
            section_syntax_indicator: false,
            private_indicator: false,
            sap_type: SAPType::NotSpecified,
            section_length: 0,
            protocol_version: 0,
            encrypted_packet: false,
            encryption_algorithm: EncryptionAlgorithm::NotEncrypted,
            pts_adjustment: 0,
            cw_index: 0,
            tier: 0xFFF,
            splice_command_length: 0,
            splice_command: command,
            descriptors: Vec::new(),
            alignment_stuffing: Vec::new(),
            e_crc32: None,
            crc32: 0,
        }
    }

    pub fn with_descriptor(mut self, descriptor: SpliceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Fills the length fields and the CRC with the values encoding
    /// produces.
    pub fn seal(mut self) -> EncodeResult<Self> {
        let bytes = self.to_bytes()?;
        self.section_length = u16::from_be_bytes([bytes[1], bytes[2]]) & 0x0FFF;
        self.splice_command_length = u16::from_be_bytes([bytes[11], bytes[12]]) & 0x0FFF;
        self.crc32 = crc::stored_crc(&bytes).unwrap_or_default();
        Ok(self)
    }

    pub fn splice_command_type(&self) -> SpliceCommandType {
        self.splice_command.command_type()
    }

    /// Descriptors that were kept as raw bytes because their payload could
    /// not be interpreted.
    pub fn descriptor_issues(&self) -> Vec<&UnparsedDescriptor> {
        self.descriptors
            .iter()
            .filter_map(|descriptor| match descriptor {
                SpliceDescriptor::Unparsed(unparsed) => Some(unparsed),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn from_bytes(buffer: &[u8], options: &DecodeOptions) -> DecodeResult<Self> {
        if buffer.len() < 3 {
            return Err(DecodeError::TruncatedInput {
                offset: 0,
                needed_bits: 24,
                available_bits: buffer.len() * 8,
            });
        }
        if buffer[0] != TABLE_ID {
            return Err(DecodeError::InvalidTableId { found: buffer[0] });
        }

        let mut header = BitReader::new(&buffer[1..3]);
        let section_syntax_indicator = header.read_bool()?;
        header.skip_bits(3)?;
        let section_length = header.read_bits(12)? as u16;
        trace!("section_length {section_length}, buffer {} bytes", buffer.len());

        let total = 3 + section_length as usize;
        if total > buffer.len() {
            return Err(DecodeError::TruncatedInput {
                offset: 3,
                needed_bits: section_length as usize * 8,
                available_bits: (buffer.len() - 3) * 8,
            });
        }
        if total < buffer.len() {
            return Err(DecodeError::SectionLengthMismatch {
                declared: section_length as usize,
                actual: buffer.len() - 3,
            });
        }
        if section_length > MAX_SECTION_LENGTH {
            return Err(DecodeError::InvalidField {
                field: "section_length",
                offset: 1,
                reason: format!("{section_length} exceeds {MAX_SECTION_LENGTH}"),
            });
        }
        if total < 20 {
            return Err(DecodeError::InvalidField {
                field: "section_length",
                offset: 1,
                reason: format!("{total} bytes cannot hold a splice_info_section"),
            });
        }
        if section_syntax_indicator {
            warn!("section_syntax_indicator is set on a SCTE-35 section");
        }

        let section = &buffer[..total];
        if options.verifies_crc() {
            let computed = crc::checksum(&section[..total - 4]);
            let declared = crc::stored_crc(section).unwrap_or_default();
            if computed != declared {
                let parsed = Self::read_body(section, options);
                if let Err(err) = &parsed {
                    debug!("section with a bad CRC-32 does not parse either: {err}");
                }
                return Err(DecodeError::CrcMismatch {
                    computed,
                    declared,
                    section: parsed.ok().map(Box::new),
                });
            }
        }
        Self::read_body(section, options)
    }

    /// Parses a framed section whose length has been checked.
    fn read_body(buffer: &[u8], options: &DecodeOptions) -> DecodeResult<Self> {
        let total = buffer.len();
        let body_end = total - 4;
        let mut reader = BitReader::new(&buffer[..body_end]);
        let table_id = reader.read_u8()?;
        let section_syntax_indicator = reader.read_bool()?;
        let private_indicator = reader.read_bool()?;
        let sap_type = SAPType::from(reader.read_bits(2)? as u8);
        let section_length = reader.read_bits(12)? as u16;
        let protocol_version = reader.read_u8()?;
        if protocol_version != 0 {
            warn!("unexpected protocol_version {protocol_version}");
        }
        let encrypted_packet = reader.read_bool()?;
        let encryption_algorithm = EncryptionAlgorithm::from(reader.read_bits(6)? as u8);
        let pts_adjustment = reader.read_bits(33)?;
        let cw_index = reader.read_u8()?;
        let tier = reader.read_bits(12)? as u16;
        let splice_command_length = reader.read_bits(12)? as u16;
        trace!("pts_adjustment {pts_adjustment}, splice_command_length {splice_command_length}");

        let (splice_command, descriptors, alignment_stuffing, e_crc32) = if encrypted_packet {
            if total < 24 {
                return Err(DecodeError::InvalidField {
                    field: "section_length",
                    offset: 1,
                    reason: format!("{total} bytes cannot hold an encrypted splice_info_section"),
                });
            }
            let payload = reader.read_bytes(body_end - HEADER_LEN - 4)?;
            let e_crc32 = reader.read_u32()?;
            (
                SpliceCommand::Encrypted(EncryptedCommand { payload }),
                Vec::new(),
                Vec::new(),
                Some(e_crc32),
            )
        } else {
            let command_type = reader.read_u8()?;
            let declared = if splice_command_length == COMMAND_LENGTH_SENTINEL {
                warn!("splice_command_length holds the legacy 0xFFF sentinel");
                None
            } else {
                Some(splice_command_length as usize)
            };

            let command_start = reader.byte_offset();
            let splice_command = SpliceCommand::read_from(&mut reader, command_type, declared)?;
            let parsed = reader.byte_offset() - command_start;
            if let Some(declared) = declared.filter(|&declared| declared != parsed) {
                return Err(DecodeError::CommandLengthMismatch {
                    command_type,
                    declared,
                    parsed,
                });
            }

            let descriptors = read_descriptor_loop(&mut reader, options)?;
            let alignment_stuffing = reader.read_bytes(reader.remaining_bytes())?;
            (splice_command, descriptors, alignment_stuffing, None)
        };

        let crc32 = crc::stored_crc(buffer).unwrap_or_default();
        Ok(SpliceInfoSection {
            table_id,
            section_syntax_indicator,
            private_indicator,
            sap_type,
            section_length,
            protocol_version,
            encrypted_packet,
            encryption_algorithm,
            pts_adjustment,
            cw_index,
            tier,
            splice_command_length,
            splice_command,
            descriptors,
            alignment_stuffing,
            e_crc32,
            crc32,
        })
    }

    /// Encodes the section, recomputing lengths and appending the CRC.
    pub(crate) fn to_bytes(&self) -> EncodeResult<Vec<u8>> {
        if self.table_id != TABLE_ID {
            return Err(EncodeError::InconsistentField {
                field: "table_id",
                reason: "a splice_info_section always has table_id 0xfc",
            });
        }
        let encrypted_command = matches!(self.splice_command, SpliceCommand::Encrypted(_));
        if self.encrypted_packet != encrypted_command
            || self.encrypted_packet != self.e_crc32.is_some()
        {
            return Err(EncodeError::InconsistentField {
                field: "encrypted_packet",
                reason: "an encrypted section needs an encrypted command and an E_CRC_32, \
                         a clear one neither",
            });
        }

        let mut body = BitWriter::new();
        let splice_command_length = if let SpliceCommand::Encrypted(encrypted) =
            &self.splice_command
        {
            body.write_bytes(&encrypted.payload)?;
            body.write_bits(u64::from(self.e_crc32.unwrap_or_default()), 32)?;
            self.splice_command_length
        } else {
            let command = self.splice_command.encode_to_vec()?;
            let mut descriptors = BitWriter::new();
            for descriptor in &self.descriptors {
                descriptor.encode(&mut descriptors)?;
            }
            let descriptors = descriptors.finish();

            body.write_bits(u64::from(u8::from(self.splice_command_type())), 8)?;
            body.write_bytes(&command)?;
            body.write_field("descriptor_loop_length", descriptors.len() as u64, 16)?;
            body.write_bytes(&descriptors)?;
            body.write_bytes(&self.alignment_stuffing)?;

            if self.splice_command_length == COMMAND_LENGTH_SENTINEL {
                if matches!(self.splice_command, SpliceCommand::PrivateCommand(_)) {
                    return Err(EncodeError::InconsistentField {
                        field: "splice_command_length",
                        reason: "the 0xFFF sentinel cannot size a private_command",
                    });
                }
                COMMAND_LENGTH_SENTINEL
            } else if command.len() >= COMMAND_LENGTH_SENTINEL as usize {
                return Err(EncodeError::FieldOverflow {
                    field: "splice_command_length",
                    value: command.len() as u64,
                    max: u64::from(COMMAND_LENGTH_SENTINEL - 1),
                });
            } else {
                command.len() as u16
            }
        };
        let body = body.finish();

        let section_length = (HEADER_LEN - 3 + body.len() + 4) as u64;
        if section_length > u64::from(MAX_SECTION_LENGTH) {
            return Err(EncodeError::FieldOverflow {
                field: "section_length",
                value: section_length,
                max: u64::from(MAX_SECTION_LENGTH),
            });
        }

        let mut writer = BitWriter::with_capacity(section_length as usize + 3);
        writer.write_bits(u64::from(self.table_id), 8)?;
        writer.write_bool(self.section_syntax_indicator)?;
        writer.write_bool(self.private_indicator)?;
        writer.write_bits(self.sap_type as u64, 2)?;
        writer.write_field("section_length", section_length, 12)?;
        writer.write_bits(u64::from(self.protocol_version), 8)?;
        writer.write_bool(self.encrypted_packet)?;
        writer.write_field(
            "encryption_algorithm",
            u64::from(u8::from(self.encryption_algorithm)),
            6,
        )?;
        writer.write_field("pts_adjustment", self.pts_adjustment, 33)?;
        writer.write_bits(u64::from(self.cw_index), 8)?;
        writer.write_field("tier", u64::from(self.tier), 12)?;
        writer.write_field("splice_command_length", u64::from(splice_command_length), 12)?;
        writer.write_bytes(&body)?;

        let mut bytes = writer.finish();
        let crc32 = crc::checksum(&bytes);
        bytes.extend_from_slice(&crc32.to_be_bytes());
        Ok(bytes)
    }
}

fn read_descriptor_loop(
    reader: &mut BitReader,
    options: &DecodeOptions,
) -> DecodeResult<Vec<SpliceDescriptor>> {
    let loop_length = reader.read_u16()? as usize;
    let loop_offset = reader.byte_offset();
    let loop_bytes = reader.read_bytes(loop_length)?;
    trace!("descriptor loop of {loop_length} bytes at byte {loop_offset}");

    let mut loop_reader = BitReader::with_base(&loop_bytes, loop_offset);
    let mut descriptors = Vec::new();
    while loop_reader.remaining_bytes() > 0 {
        let offset = loop_reader.byte_offset();
        let descriptor = SpliceDescriptor::read_from(&mut loop_reader)?;
        if let SpliceDescriptor::Unparsed(unparsed) = &descriptor {
            if options.strict() {
                return Err(DecodeError::MalformedDescriptor {
                    tag: unparsed.tag,
                    offset,
                    issue: unparsed.issue.clone(),
                    raw: unparsed.data.clone(),
                });
            }
        }
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}

/// Stream access point type of the first byte after the splice point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum SAPType {
    Type1 = 0x00,
    Type2 = 0x01,
    Type3 = 0x02,
    NotSpecified = 0x03,
}

impl From<u8> for SAPType {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0x00 => SAPType::Type1,
            0x01 => SAPType::Type2,
            0x02 => SAPType::Type3,
            _ => SAPType::NotSpecified,
        }
    }
}

impl Display for SAPType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SAPType::Type1 => write!(f, "Type 1"),
            SAPType::Type2 => write!(f, "Type 2"),
            SAPType::Type3 => write!(f, "Type 3"),
            SAPType::NotSpecified => write!(f, "Not Specified"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "u8", into = "u8"))]
pub enum EncryptionAlgorithm {
    NotEncrypted,
    DESECBMode,
    DESCBCMode,
    TripleDESEDE3ECBMode,
    /// 4 through 31
    Reserved(u8),
    /// 32 through 63
    Private(u8),
}

impl From<u8> for EncryptionAlgorithm {
    fn from(value: u8) -> Self {
        match value {
            0x00 => EncryptionAlgorithm::NotEncrypted,
            0x01 => EncryptionAlgorithm::DESECBMode,
            0x02 => EncryptionAlgorithm::DESCBCMode,
            0x03 => EncryptionAlgorithm::TripleDESEDE3ECBMode,
            0x04..=0x1F => EncryptionAlgorithm::Reserved(value),
            _ => EncryptionAlgorithm::Private(value),
        }
    }
}

impl From<EncryptionAlgorithm> for u8 {
    fn from(value: EncryptionAlgorithm) -> Self {
        match value {
            EncryptionAlgorithm::NotEncrypted => 0x00,
            EncryptionAlgorithm::DESECBMode => 0x01,
            EncryptionAlgorithm::DESCBCMode => 0x02,
            EncryptionAlgorithm::TripleDESEDE3ECBMode => 0x03,
            EncryptionAlgorithm::Reserved(value) | EncryptionAlgorithm::Private(value) => value,
        }
    }
}

impl Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncryptionAlgorithm::NotEncrypted => write!(f, "No encryption"),
            EncryptionAlgorithm::DESECBMode => write!(f, "DES - ECB mode"),
            EncryptionAlgorithm::DESCBCMode => write!(f, "DES - CBC mode"),
            EncryptionAlgorithm::TripleDESEDE3ECBMode => write!(f, "Triple DES EDE3 - ECB mode"),
            EncryptionAlgorithm::Reserved(value) => write!(f, "Reserved ({value})"),
            EncryptionAlgorithm::Private(value) => write!(f, "User private ({value})"),
        }
    }
}
