//! Decoding and encoding of SCTE-35 `splice_info_section` messages.
//!
//! A cue decodes into a [`SpliceInfoSection`] that keeps every field needed
//! to write the same bytes back, including descriptors the decoder could not
//! interpret and trailing alignment stuffing.
//!
//! ```rust
//! use data_encoding::BASE64;
//! use scte35_codec::{decode, encode, SpliceCommand};
//!
//! let bytes = BASE64.decode(b"/DAWAAAAAAAAAP/wBQb+Qjo1vQAAuwxz9A==").unwrap();
//! let section = decode(&bytes).unwrap();
//!
//! match &section.splice_command {
//!     SpliceCommand::TimeSignal(signal) => {
//!         assert_eq!(signal.splice_time.pts_time(), Some(1_111_111_101));
//!     }
//!     other => panic!("unexpected command {other:?}"),
//! }
//! assert_eq!(encode(&section).unwrap(), bytes);
//! ```
//!
//! New cues are built from their command and sealed, which fills in the
//! derived lengths:
//!
//! ```rust
//! use scte35_codec::{encode, SpliceCommand, SpliceInfoSection, SpliceInsert};
//!
//! let section = SpliceInfoSection::new(SpliceCommand::SpliceInsert(
//!     SpliceInsert::out_of_network(42, 900_000, 2_700_000),
//! ))
//! .seal()
//! .unwrap();
//! assert_eq!(section.splice_command_length, 20);
//! let bytes = encode(&section).unwrap();
//! assert_eq!(bytes.len(), section.section_length as usize + 3);
//! ```

pub mod bit_reader;
pub mod bit_writer;
pub mod commands;
pub mod crc;
mod cue;
pub mod descriptors;
pub mod error;
pub mod fmt;
#[cfg(feature = "serde")]
mod hex_serde;
pub mod section;
#[cfg(feature = "text-encoding")]
pub mod text;
pub mod time;
pub mod upid;

pub use bit_reader::BitReader;
pub use bit_writer::{BitWriter, Encodable};
pub use commands::{
    EncryptedCommand, PrivateCommand, ScheduleTiming, ScheduledComponent, ScheduledEvent,
    ScheduledEventDetail, SpliceCommand, SpliceCommandType, SpliceInsert, SpliceInsertComponent,
    SpliceInsertEvent, SpliceInsertTiming, SpliceSchedule, TimeSignal,
};
pub use cue::{DecodeOptions, decode, decode_with, encode};
pub use descriptors::{
    AudioComponent, DeliveryRestrictions, DeviceRestrictions, PrivateDescriptor,
    SegmentationComponent, SegmentationDescriptor, SegmentationEvent, SegmentationType,
    SpliceDescriptor, SpliceDescriptorTag, SubSegment, UnparsedDescriptor,
};
pub use error::{DecodeError, DecodeResult, DescriptorIssue, EncodeError, EncodeResult};
pub use section::{EncryptionAlgorithm, SAPType, SpliceInfoSection};
pub use time::{BreakDuration, ClockTimeExt, SpliceTime, ticks_to_secs};
pub use upid::{SegmentationUpid, SegmentationUpidType};

#[cfg(test)]
mod tests;
