//! Human-readable rendering of cues.
//!
//! [`SpliceInfoSection`] implements [`Display`] as an indented report, the
//! form the command-line tool prints.

use crate::commands::{ScheduleTiming, SpliceCommand, SpliceInsertTiming};
use crate::descriptors::{SegmentationDescriptor, SpliceDescriptor};
use crate::section::SpliceInfoSection;
use crate::time::{SpliceTime, ticks_to_secs};
use std::fmt::{self, Display, Formatter};

/// Renders a 32-bit identifier as ASCII when every byte is a letter or
/// digit, as hex otherwise.
///
/// ```rust
/// use scte35_codec::fmt::format_identifier;
///
/// assert_eq!(format_identifier(0x43554549), "CUEI");
/// assert_eq!(format_identifier(0x12345678), "0x12345678");
/// ```
pub fn format_identifier(identifier: u32) -> String {
    let bytes = identifier.to_be_bytes();
    if bytes.iter().all(u8::is_ascii_alphanumeric) {
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        format!("0x{identifier:08X}")
    }
}

/// Renders bytes as hex, eliding everything past the first six bytes of
/// long buffers.
///
/// ```rust
/// use scte35_codec::fmt::format_as_hex;
///
/// assert_eq!(format_as_hex(&[0x01, 0x02, 0x03]), "0x010203");
/// assert_eq!(format_as_hex(&(0..20).collect::<Vec<u8>>()), "0x000102030405... (20 bytes)");
/// ```
pub fn format_as_hex(data: &[u8]) -> String {
    let shown = if data.len() <= 8 { data } else { &data[..6] };
    let hex: String = shown.iter().map(|b| format!("{b:02x}")).collect();
    if shown.len() == data.len() {
        format!("0x{hex}")
    } else {
        format!("0x{hex}... ({} bytes)", data.len())
    }
}

fn format_ticks(ticks: u64) -> String {
    format!("{ticks} ({:.6} s)", ticks_to_secs(ticks))
}

fn format_splice_time(time: &SpliceTime) -> String {
    match time.pts_time() {
        Some(pts) => format_ticks(pts),
        None => "not specified".to_string(),
    }
}

impl Display for SpliceInfoSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Splice Info Section")?;
        writeln!(f, "  Table ID: 0x{:02x}", self.table_id)?;
        writeln!(f, "  Section Length: {}", self.section_length)?;
        writeln!(f, "  SAP Type: {}", self.sap_type)?;
        writeln!(f, "  Protocol Version: {}", self.protocol_version)?;
        writeln!(f, "  Encrypted Packet: {}", self.encrypted_packet)?;
        if self.encrypted_packet {
            writeln!(f, "  Encryption Algorithm: {}", self.encryption_algorithm)?;
            writeln!(f, "  CW Index: {}", self.cw_index)?;
        }
        writeln!(f, "  PTS Adjustment: {}", format_ticks(self.pts_adjustment))?;
        writeln!(f, "  Tier: 0x{:03x}", self.tier)?;
        writeln!(f, "  Splice Command Length: {}", self.splice_command_length)?;
        writeln!(f, "  Splice Command: {}", self.splice_command_type())?;
        write_command(f, &self.splice_command)?;

        writeln!(f, "  Descriptors: {}", self.descriptors.len())?;
        for descriptor in &self.descriptors {
            write_descriptor(f, descriptor)?;
        }
        if !self.alignment_stuffing.is_empty() {
            writeln!(
                f,
                "  Alignment Stuffing: {}",
                format_as_hex(&self.alignment_stuffing)
            )?;
        }
        if let Some(e_crc32) = self.e_crc32 {
            writeln!(f, "  E_CRC_32: 0x{e_crc32:08x}")?;
        }
        write!(f, "  CRC-32: 0x{:08x}", self.crc32)
    }
}

fn write_command(f: &mut Formatter<'_>, command: &SpliceCommand) -> fmt::Result {
    match command {
        SpliceCommand::SpliceNull | SpliceCommand::BandwidthReservation => Ok(()),
        SpliceCommand::TimeSignal(signal) => {
            writeln!(f, "    Splice Time: {}", format_splice_time(&signal.splice_time))
        }
        SpliceCommand::SpliceInsert(insert) => {
            writeln!(f, "    Splice Event ID: 0x{:08x}", insert.splice_event_id)?;
            let Some(event) = &insert.event else {
                return writeln!(f, "    Cancelled");
            };
            writeln!(f, "    Out Of Network: {}", event.out_of_network_indicator)?;
            writeln!(f, "    Splice Immediate: {}", event.splice_immediate_flag)?;
            match &event.timing {
                SpliceInsertTiming::Program {
                    splice_time: Some(time),
                } => writeln!(f, "    Splice Time: {}", format_splice_time(time))?,
                SpliceInsertTiming::Program { splice_time: None } => {}
                SpliceInsertTiming::Component { components } => {
                    for component in components {
                        let time = component
                            .splice_time
                            .as_ref()
                            .map_or_else(|| "immediate".to_string(), format_splice_time);
                        writeln!(f, "    Component 0x{:02x}: {time}", component.component_tag)?;
                    }
                }
            }
            if let Some(duration) = &event.break_duration {
                writeln!(
                    f,
                    "    Break Duration: {} (auto return: {})",
                    format_ticks(duration.duration),
                    duration.auto_return
                )?;
            }
            writeln!(f, "    Unique Program ID: {}", event.unique_program_id)?;
            writeln!(
                f,
                "    Avail: {}/{}",
                event.avail_num, event.avails_expected
            )
        }
        SpliceCommand::SpliceSchedule(schedule) => {
            for scheduled in &schedule.events {
                writeln!(f, "    Event 0x{:08x}", scheduled.splice_event_id)?;
                let Some(event) = &scheduled.event else {
                    writeln!(f, "      Cancelled")?;
                    continue;
                };
                writeln!(f, "      Out Of Network: {}", event.out_of_network_indicator)?;
                match &event.timing {
                    ScheduleTiming::Program { utc_splice_time } => {
                        writeln!(f, "      UTC Splice Time: {utc_splice_time}")?
                    }
                    ScheduleTiming::Component { components } => {
                        for component in components {
                            writeln!(
                                f,
                                "      Component 0x{:02x}: {}",
                                component.component_tag, component.utc_splice_time
                            )?;
                        }
                    }
                }
                if let Some(duration) = &event.break_duration {
                    writeln!(f, "      Break Duration: {}", format_ticks(duration.duration))?;
                }
            }
            Ok(())
        }
        SpliceCommand::PrivateCommand(private) => {
            writeln!(f, "    Identifier: {}", format_identifier(private.identifier))?;
            writeln!(f, "    Data: {}", format_as_hex(&private.private_bytes))
        }
        SpliceCommand::Encrypted(encrypted) => {
            writeln!(f, "    Ciphertext: {}", format_as_hex(&encrypted.payload))
        }
    }
}

fn write_descriptor(f: &mut Formatter<'_>, descriptor: &SpliceDescriptor) -> fmt::Result {
    match descriptor {
        SpliceDescriptor::Avail { provider_avail_id } => {
            writeln!(f, "    Avail: provider_avail_id {provider_avail_id}")
        }
        SpliceDescriptor::Dtmf {
            preroll,
            dtmf_chars,
        } => writeln!(f, "    DTMF: \"{dtmf_chars}\" preroll {preroll}"),
        SpliceDescriptor::Segmentation(segmentation) => write_segmentation(f, segmentation),
        SpliceDescriptor::Time {
            tai_seconds,
            tai_ns,
            utc_offset,
        } => writeln!(
            f,
            "    Time: TAI {tai_seconds}.{tai_ns:09} UTC offset {utc_offset}"
        ),
        SpliceDescriptor::Audio { components } => {
            writeln!(f, "    Audio: {} components", components.len())?;
            for component in components {
                writeln!(
                    f,
                    "      0x{:02x} {} channels {}",
                    component.component_tag, component.iso_code, component.num_channels
                )?;
            }
            Ok(())
        }
        SpliceDescriptor::Private(private) => writeln!(
            f,
            "    Private 0x{:02x}: {}",
            private.tag,
            format_as_hex(&private.data)
        ),
        SpliceDescriptor::Unparsed(unparsed) => writeln!(
            f,
            "    Unparsed 0x{:02x}: {} ({})",
            unparsed.tag,
            format_as_hex(&unparsed.data),
            unparsed.issue
        ),
    }
}

fn write_segmentation(f: &mut Formatter<'_>, descriptor: &SegmentationDescriptor) -> fmt::Result {
    writeln!(
        f,
        "    Segmentation: event 0x{:08x}",
        descriptor.segmentation_event_id
    )?;
    let Some(event) = &descriptor.event else {
        return writeln!(f, "      Cancelled");
    };
    writeln!(f, "      Type: {}", event.segmentation_type)?;
    writeln!(
        f,
        "      Segment: {}/{}",
        event.segment_num, event.segments_expected
    )?;
    if let Some(sub_segment) = &event.sub_segment {
        writeln!(
            f,
            "      Sub-segment: {}/{}",
            sub_segment.sub_segment_num, sub_segment.sub_segments_expected
        )?;
    }
    if let Some(duration) = event.segmentation_duration {
        writeln!(f, "      Duration: {}", format_ticks(duration))?;
    }
    writeln!(f, "      UPID ({}): {}", event.upid.upid_type, event.upid)
}
