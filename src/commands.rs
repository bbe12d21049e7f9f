//! Splice commands: the primary instruction carried by a cue.
//!
//! Each command is decoded from the bytes between `splice_command_type` and
//! `descriptor_loop_length`. Flag-gated fields are modelled as `Option`s or
//! enum variants tied to their flag, so a decoded command can only hold the
//! fields that were actually on the wire.

use crate::bit_reader::BitReader;
use crate::bit_writer::{BitWriter, Encodable};
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::time::{BreakDuration, SpliceTime};
use log::debug;
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Known values of the `splice_command_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpliceCommandType {
    SpliceNull,
    SpliceSchedule,
    SpliceInsert,
    TimeSignal,
    BandwidthReservation,
    PrivateCommand,
    Reserved(u8),
}

impl From<u8> for SpliceCommandType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => SpliceCommandType::SpliceNull,
            0x04 => SpliceCommandType::SpliceSchedule,
            0x05 => SpliceCommandType::SpliceInsert,
            0x06 => SpliceCommandType::TimeSignal,
            0x07 => SpliceCommandType::BandwidthReservation,
            0xFF => SpliceCommandType::PrivateCommand,
            other => SpliceCommandType::Reserved(other),
        }
    }
}

impl From<SpliceCommandType> for u8 {
    fn from(value: SpliceCommandType) -> Self {
        match value {
            SpliceCommandType::SpliceNull => 0x00,
            SpliceCommandType::SpliceSchedule => 0x04,
            SpliceCommandType::SpliceInsert => 0x05,
            SpliceCommandType::TimeSignal => 0x06,
            SpliceCommandType::BandwidthReservation => 0x07,
            SpliceCommandType::PrivateCommand => 0xFF,
            SpliceCommandType::Reserved(other) => other,
        }
    }
}

impl Display for SpliceCommandType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SpliceCommandType::SpliceNull => write!(f, "Splice Null"),
            SpliceCommandType::SpliceSchedule => write!(f, "Splice Schedule"),
            SpliceCommandType::SpliceInsert => write!(f, "Splice Insert"),
            SpliceCommandType::TimeSignal => write!(f, "Time Signal"),
            SpliceCommandType::BandwidthReservation => write!(f, "Bandwidth Reservation"),
            SpliceCommandType::PrivateCommand => write!(f, "Private Command"),
            SpliceCommandType::Reserved(value) => write!(f, "Reserved (0x{value:02x})"),
        }
    }
}

/// The splice command of a cue.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum SpliceCommand {
    SpliceNull,
    SpliceSchedule(SpliceSchedule),
    SpliceInsert(SpliceInsert),
    TimeSignal(TimeSignal),
    BandwidthReservation,
    PrivateCommand(PrivateCommand),
    /// The encrypted part of an `encrypted_packet` section, kept opaque.
    Encrypted(EncryptedCommand),
}

impl SpliceCommand {
    pub fn command_type(&self) -> SpliceCommandType {
        match self {
            SpliceCommand::SpliceNull => SpliceCommandType::SpliceNull,
            SpliceCommand::SpliceSchedule(_) => SpliceCommandType::SpliceSchedule,
            SpliceCommand::SpliceInsert(_) => SpliceCommandType::SpliceInsert,
            SpliceCommand::TimeSignal(_) => SpliceCommandType::TimeSignal,
            SpliceCommand::BandwidthReservation => SpliceCommandType::BandwidthReservation,
            SpliceCommand::PrivateCommand(_) => SpliceCommandType::PrivateCommand,
            // the type byte itself is ciphertext
            SpliceCommand::Encrypted(encrypted) => {
                SpliceCommandType::from(encrypted.payload.first().copied().unwrap_or_default())
            }
        }
    }

    /// Decodes a command body whose type byte has already been read.
    ///
    /// `declared_len` is the `splice_command_length`, or `None` when the
    /// section carries the legacy 0xFFF sentinel.
    pub(crate) fn read_from(
        reader: &mut BitReader,
        command_type: u8,
        declared_len: Option<usize>,
    ) -> DecodeResult<Self> {
        debug!(
            "decoding {} command at byte {}",
            SpliceCommandType::from(command_type),
            reader.byte_offset()
        );
        match SpliceCommandType::from(command_type) {
            SpliceCommandType::SpliceNull => Ok(SpliceCommand::SpliceNull),
            SpliceCommandType::SpliceSchedule => {
                Ok(SpliceCommand::SpliceSchedule(SpliceSchedule::read_from(reader)?))
            }
            SpliceCommandType::SpliceInsert => {
                Ok(SpliceCommand::SpliceInsert(SpliceInsert::read_from(reader)?))
            }
            SpliceCommandType::TimeSignal => Ok(SpliceCommand::TimeSignal(TimeSignal {
                splice_time: SpliceTime::read_from(reader)?,
            })),
            SpliceCommandType::BandwidthReservation => Ok(SpliceCommand::BandwidthReservation),
            SpliceCommandType::PrivateCommand => Ok(SpliceCommand::PrivateCommand(
                PrivateCommand::read_from(reader, declared_len)?,
            )),
            SpliceCommandType::Reserved(command_type) => {
                let offset = reader.byte_offset();
                let raw = declared_len
                    .map(|len| len.min(reader.remaining_bytes()))
                    .map(|len| reader.read_bytes(len))
                    .transpose()?
                    .unwrap_or_default();
                Err(DecodeError::UnknownCommandType {
                    command_type,
                    offset,
                    raw,
                })
            }
        }
    }
}

impl Encodable for SpliceCommand {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        match self {
            SpliceCommand::SpliceNull | SpliceCommand::BandwidthReservation => Ok(()),
            SpliceCommand::SpliceSchedule(schedule) => schedule.encode(writer),
            SpliceCommand::SpliceInsert(insert) => insert.encode(writer),
            SpliceCommand::TimeSignal(signal) => signal.splice_time.encode(writer),
            SpliceCommand::PrivateCommand(private) => private.encode(writer),
            SpliceCommand::Encrypted(encrypted) => writer.write_bytes(&encrypted.payload),
        }
    }
}

/// `splice_insert()`: signals a splice point, typically the start or end of
/// an ad break.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpliceInsert {
    pub splice_event_id: u32,
    /// `None` when the event is cancelled; nothing follows the cancel flag
    /// on the wire in that case.
    pub event: Option<SpliceInsertEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpliceInsertEvent {
    pub out_of_network_indicator: bool,
    pub splice_immediate_flag: bool,
    pub timing: SpliceInsertTiming,
    pub break_duration: Option<BreakDuration>,
    pub unique_program_id: u16,
    pub avail_num: u8,
    pub avails_expected: u8,
}

/// Program-level or component-level timing of a splice insert.
///
/// Splice times are `None` exactly when `splice_immediate_flag` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpliceInsertTiming {
    Program {
        splice_time: Option<SpliceTime>,
    },
    Component {
        components: Vec<SpliceInsertComponent>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpliceInsertComponent {
    pub component_tag: u8,
    pub splice_time: Option<SpliceTime>,
}

impl SpliceInsert {
    /// A program-level insert leaving the network at `pts_time` for a
    /// break that returns automatically.
    pub fn out_of_network(splice_event_id: u32, pts_time: u64, break_duration: u64) -> Self {
        SpliceInsert {
            splice_event_id,
            event: Some(SpliceInsertEvent {
                out_of_network_indicator: true,
                splice_immediate_flag: false,
                timing: SpliceInsertTiming::Program {
                    splice_time: Some(SpliceTime::from_ticks(pts_time)),
                },
                break_duration: Some(BreakDuration {
                    auto_return: true,
                    duration: break_duration,
                }),
                unique_program_id: 0,
                avail_num: 0,
                avails_expected: 0,
            }),
        }
    }

    pub fn splice_event_cancel_indicator(&self) -> bool {
        self.event.is_none()
    }

    pub fn program_splice_flag(&self) -> bool {
        matches!(
            self.event,
            Some(SpliceInsertEvent {
                timing: SpliceInsertTiming::Program { .. },
                ..
            })
        )
    }

    pub fn duration_flag(&self) -> bool {
        self.event
            .as_ref()
            .is_some_and(|event| event.break_duration.is_some())
    }

    fn read_from(reader: &mut BitReader) -> DecodeResult<Self> {
        let splice_event_id = reader.read_u32()?;
        let cancelled = reader.read_bool()?;
        reader.read_reserved(7)?;
        if cancelled {
            return Ok(SpliceInsert {
                splice_event_id,
                event: None,
            });
        }

        let out_of_network_indicator = reader.read_bool()?;
        let program_splice_flag = reader.read_bool()?;
        let duration_flag = reader.read_bool()?;
        let splice_immediate_flag = reader.read_bool()?;
        reader.read_reserved(4)?;

        let timing = if program_splice_flag {
            let splice_time = if splice_immediate_flag {
                None
            } else {
                Some(SpliceTime::read_from(reader)?)
            };
            SpliceInsertTiming::Program { splice_time }
        } else {
            let component_count = reader.read_u8()?;
            let mut components = Vec::with_capacity(component_count as usize);
            for _ in 0..component_count {
                let component_tag = reader.read_u8()?;
                let splice_time = if splice_immediate_flag {
                    None
                } else {
                    Some(SpliceTime::read_from(reader)?)
                };
                components.push(SpliceInsertComponent {
                    component_tag,
                    splice_time,
                });
            }
            SpliceInsertTiming::Component { components }
        };

        let break_duration = if duration_flag {
            Some(BreakDuration::read_from(reader)?)
        } else {
            None
        };

        Ok(SpliceInsert {
            splice_event_id,
            event: Some(SpliceInsertEvent {
                out_of_network_indicator,
                splice_immediate_flag,
                timing,
                break_duration,
                unique_program_id: reader.read_u16()?,
                avail_num: reader.read_u8()?,
                avails_expected: reader.read_u8()?,
            }),
        })
    }
}

fn check_immediate(immediate: bool, splice_time: &Option<SpliceTime>) -> EncodeResult<()> {
    match (immediate, splice_time) {
        (true, Some(_)) => Err(EncodeError::InconsistentField {
            field: "splice_immediate_flag",
            reason: "an immediate splice cannot carry a splice_time",
        }),
        (false, None) => Err(EncodeError::InconsistentField {
            field: "splice_immediate_flag",
            reason: "a splice that is not immediate needs a splice_time",
        }),
        _ => Ok(()),
    }
}

impl Encodable for SpliceInsert {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        writer.write_field("splice_event_id", u64::from(self.splice_event_id), 32)?;
        writer.write_bool(self.event.is_none())?;
        writer.write_reserved(7)?;
        let Some(event) = &self.event else {
            return Ok(());
        };

        writer.write_bool(event.out_of_network_indicator)?;
        writer.write_bool(matches!(event.timing, SpliceInsertTiming::Program { .. }))?;
        writer.write_bool(event.break_duration.is_some())?;
        writer.write_bool(event.splice_immediate_flag)?;
        writer.write_reserved(4)?;

        match &event.timing {
            SpliceInsertTiming::Program { splice_time } => {
                check_immediate(event.splice_immediate_flag, splice_time)?;
                if let Some(splice_time) = splice_time {
                    splice_time.encode(writer)?;
                }
            }
            SpliceInsertTiming::Component { components } => {
                writer.write_field("component_count", components.len() as u64, 8)?;
                for component in components {
                    check_immediate(event.splice_immediate_flag, &component.splice_time)?;
                    writer.write_bits(u64::from(component.component_tag), 8)?;
                    if let Some(splice_time) = &component.splice_time {
                        splice_time.encode(writer)?;
                    }
                }
            }
        }

        if let Some(break_duration) = &event.break_duration {
            break_duration.encode(writer)?;
        }
        writer.write_bits(u64::from(event.unique_program_id), 16)?;
        writer.write_bits(u64::from(event.avail_num), 8)?;
        writer.write_bits(u64::from(event.avails_expected), 8)
    }
}

/// `splice_schedule()`: splice events announced ahead of time in UTC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpliceSchedule {
    pub events: Vec<ScheduledEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduledEvent {
    pub splice_event_id: u32,
    /// `None` when the event is cancelled.
    pub event: Option<ScheduledEventDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduledEventDetail {
    pub out_of_network_indicator: bool,
    pub timing: ScheduleTiming,
    pub break_duration: Option<BreakDuration>,
    pub unique_program_id: u16,
    pub avail_num: u8,
    pub avails_expected: u8,
}

/// Splice times of a scheduled event, in seconds since the GPS epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScheduleTiming {
    Program { utc_splice_time: u32 },
    Component { components: Vec<ScheduledComponent> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduledComponent {
    pub component_tag: u8,
    pub utc_splice_time: u32,
}

impl SpliceSchedule {
    fn read_from(reader: &mut BitReader) -> DecodeResult<Self> {
        let splice_count = reader.read_u8()?;
        let mut events = Vec::with_capacity(splice_count as usize);
        for _ in 0..splice_count {
            events.push(ScheduledEvent::read_from(reader)?);
        }
        Ok(SpliceSchedule { events })
    }
}

impl ScheduledEvent {
    fn read_from(reader: &mut BitReader) -> DecodeResult<Self> {
        let splice_event_id = reader.read_u32()?;
        let cancelled = reader.read_bool()?;
        reader.read_reserved(7)?;
        if cancelled {
            return Ok(ScheduledEvent {
                splice_event_id,
                event: None,
            });
        }

        let out_of_network_indicator = reader.read_bool()?;
        let program_splice_flag = reader.read_bool()?;
        let duration_flag = reader.read_bool()?;
        reader.read_reserved(5)?;

        let timing = if program_splice_flag {
            ScheduleTiming::Program {
                utc_splice_time: reader.read_u32()?,
            }
        } else {
            let component_count = reader.read_u8()?;
            let mut components = Vec::with_capacity(component_count as usize);
            for _ in 0..component_count {
                components.push(ScheduledComponent {
                    component_tag: reader.read_u8()?,
                    utc_splice_time: reader.read_u32()?,
                });
            }
            ScheduleTiming::Component { components }
        };

        let break_duration = if duration_flag {
            Some(BreakDuration::read_from(reader)?)
        } else {
            None
        };

        Ok(ScheduledEvent {
            splice_event_id,
            event: Some(ScheduledEventDetail {
                out_of_network_indicator,
                timing,
                break_duration,
                unique_program_id: reader.read_u16()?,
                avail_num: reader.read_u8()?,
                avails_expected: reader.read_u8()?,
            }),
        })
    }
}

impl Encodable for SpliceSchedule {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        writer.write_field("splice_count", self.events.len() as u64, 8)?;
        for event in &self.events {
            event.encode(writer)?;
        }
        Ok(())
    }
}

impl Encodable for ScheduledEvent {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        writer.write_bits(u64::from(self.splice_event_id), 32)?;
        writer.write_bool(self.event.is_none())?;
        writer.write_reserved(7)?;
        let Some(event) = &self.event else {
            return Ok(());
        };

        writer.write_bool(event.out_of_network_indicator)?;
        writer.write_bool(matches!(event.timing, ScheduleTiming::Program { .. }))?;
        writer.write_bool(event.break_duration.is_some())?;
        writer.write_reserved(5)?;

        match &event.timing {
            ScheduleTiming::Program { utc_splice_time } => {
                writer.write_bits(u64::from(*utc_splice_time), 32)?;
            }
            ScheduleTiming::Component { components } => {
                writer.write_field("component_count", components.len() as u64, 8)?;
                for component in components {
                    writer.write_bits(u64::from(component.component_tag), 8)?;
                    writer.write_bits(u64::from(component.utc_splice_time), 32)?;
                }
            }
        }

        if let Some(break_duration) = &event.break_duration {
            break_duration.encode(writer)?;
        }
        writer.write_bits(u64::from(event.unique_program_id), 16)?;
        writer.write_bits(u64::from(event.avail_num), 8)?;
        writer.write_bits(u64::from(event.avails_expected), 8)
    }
}

/// `time_signal()`: a bare timestamp, usually qualified by segmentation
/// descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSignal {
    pub splice_time: SpliceTime,
}

/// `private_command()`: an identifier followed by vendor-defined bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrivateCommand {
    pub identifier: u32,
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_serde"))]
    pub private_bytes: Vec<u8>,
}

impl PrivateCommand {
    fn read_from(reader: &mut BitReader, declared_len: Option<usize>) -> DecodeResult<Self> {
        let offset = reader.byte_offset();
        let Some(declared_len) = declared_len else {
            return Err(DecodeError::InvalidField {
                field: "splice_command_length",
                offset,
                reason: "the 0xFFF sentinel cannot size a private_command".to_string(),
            });
        };
        let Some(data_len) = declared_len.checked_sub(4) else {
            return Err(DecodeError::InvalidField {
                field: "splice_command_length",
                offset,
                reason: format!("{declared_len} bytes cannot hold a private_command identifier"),
            });
        };
        Ok(PrivateCommand {
            identifier: reader.read_u32()?,
            private_bytes: reader.read_bytes(data_len)?,
        })
    }
}

impl Encodable for PrivateCommand {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        writer.write_bits(u64::from(self.identifier), 32)?;
        writer.write_bytes(&self.private_bytes)
    }
}

/// Ciphertext of an encrypted section: every byte from
/// `splice_command_type` through the alignment stuffing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncryptedCommand {
    #[cfg_attr(feature = "serde", serde(with = "crate::hex_serde"))]
    pub payload: Vec<u8>,
}
