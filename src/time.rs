//! Timing primitives shared by splice commands: `splice_time()` and
//! `break_duration()`, plus helpers for the 90 kHz presentation clock.

use crate::bit_reader::BitReader;
use crate::bit_writer::{BitWriter, Encodable};
use crate::error::{DecodeResult, EncodeError, EncodeResult};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ticks of the 90 kHz presentation clock per second.
pub const TICKS_PER_SECOND: u64 = 90_000;

/// Largest value a 33-bit PTS field can hold.
pub const PTS_MAX: u64 = 0x1_FFFF_FFFF;

pub trait ClockTimeExt {
    fn as_90k(&self) -> u64;
}

impl ClockTimeExt for Duration {
    fn as_90k(&self) -> u64 {
        (self.as_secs_f64() * TICKS_PER_SECOND as f64) as u64
    }
}

/// Converts 90 kHz ticks to seconds, rounded up to 6 decimal places.
pub fn ticks_to_secs(value: u64) -> f64 {
    (value as f64 / TICKS_PER_SECOND as f64 * 1_000_000.0).ceil() / 1_000_000.0
}

fn ticks_to_duration(ticks: u64) -> Duration {
    // 1 tick = 100_000 / 9 ns
    let nanos = u128::from(ticks) * 100_000 / 9;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// A `splice_time()` structure.
///
/// The time is either a 33-bit PTS value or explicitly absent; the two
/// cases encode differently and are kept distinct so they survive a round
/// trip.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpliceTime {
    Specified { pts_time: u64 },
    #[default]
    NotSpecified,
}

impl SpliceTime {
    pub fn from_ticks(ticks: u64) -> Self {
        SpliceTime::Specified { pts_time: ticks }
    }

    pub fn pts_time(&self) -> Option<u64> {
        match self {
            SpliceTime::Specified { pts_time } => Some(*pts_time),
            SpliceTime::NotSpecified => None,
        }
    }

    pub fn time_specified_flag(&self) -> bool {
        matches!(self, SpliceTime::Specified { .. })
    }

    /// The PTS as a duration since the start of the 90 kHz clock.
    pub fn to_duration(&self) -> Option<Duration> {
        self.pts_time().map(ticks_to_duration)
    }

    /// Applies a section's `pts_adjustment`, wrapping at 33 bits.
    pub fn adjusted(&self, pts_adjustment: u64) -> Option<u64> {
        self.pts_time()
            .map(|pts| pts.wrapping_add(pts_adjustment) & PTS_MAX)
    }

    pub(crate) fn read_from(reader: &mut BitReader) -> DecodeResult<Self> {
        if reader.read_bool()? {
            reader.read_reserved(6)?;
            let pts_time = reader.read_bits(33)?;
            Ok(SpliceTime::Specified { pts_time })
        } else {
            reader.read_reserved(7)?;
            Ok(SpliceTime::NotSpecified)
        }
    }
}

impl Encodable for SpliceTime {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        match self {
            SpliceTime::Specified { pts_time } => {
                writer.write_bool(true)?;
                writer.write_reserved(6)?;
                writer.write_field("pts_time", *pts_time, 33)
            }
            SpliceTime::NotSpecified => {
                writer.write_bool(false)?;
                writer.write_reserved(7)
            }
        }
    }
}

/// A `break_duration()` structure: the length of a break in 90 kHz ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BreakDuration {
    /// Whether the splicer returns to the network on its own when the
    /// break ends.
    pub auto_return: bool,
    pub duration: u64,
}

impl BreakDuration {
    /// Builds a break duration from wall-clock time.
    pub fn from_duration(duration: Duration, auto_return: bool) -> EncodeResult<Self> {
        let ticks = duration.as_90k();
        if ticks > PTS_MAX {
            return Err(EncodeError::FieldOverflow {
                field: "break_duration",
                value: ticks,
                max: PTS_MAX,
            });
        }
        Ok(BreakDuration {
            auto_return,
            duration: ticks,
        })
    }

    pub fn to_duration(&self) -> Duration {
        ticks_to_duration(self.duration)
    }

    pub(crate) fn read_from(reader: &mut BitReader) -> DecodeResult<Self> {
        let auto_return = reader.read_bool()?;
        reader.read_reserved(6)?;
        let duration = reader.read_bits(33)?;
        Ok(BreakDuration {
            auto_return,
            duration,
        })
    }
}

impl Encodable for BreakDuration {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        writer.write_bool(self.auto_return)?;
        writer.write_reserved(6)?;
        writer.write_field("break_duration", self.duration, 33)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_time() {
        let duration = Duration::from_secs(1);
        assert_eq!(duration.as_90k(), 90_000);
    }

    #[test]
    fn test_wall_clock_to_ticks() {
        let time = Duration::from_secs_f64(21388.766756);
        assert_eq!(time.as_90k(), 0x072bd0050);
    }

    #[test]
    fn ticks_render_as_seconds() {
        assert_eq!(ticks_to_secs(90_000), 1.0);
        assert_eq!(ticks_to_secs(2_700_000), 30.0);
    }

    #[test]
    fn specified_time_round_trips() {
        let bytes = [0xFE, 0x72, 0xBD, 0x00, 0x50];
        let time = SpliceTime::read_from(&mut BitReader::new(&bytes)).unwrap();
        assert_eq!(time, SpliceTime::from_ticks(0x072bd0050));
        assert_eq!(time.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn unspecified_time_is_one_byte() {
        let bytes = [0x7F];
        let time = SpliceTime::read_from(&mut BitReader::new(&bytes)).unwrap();
        assert_eq!(time, SpliceTime::NotSpecified);
        assert!(!time.time_specified_flag());
        assert_eq!(time.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn pts_wider_than_33_bits_is_rejected() {
        let err = SpliceTime::from_ticks(PTS_MAX + 1).encode_to_vec().unwrap_err();
        assert!(matches!(
            err,
            EncodeError::FieldOverflow {
                field: "pts_time",
                ..
            }
        ));
    }

    #[test]
    fn adjustment_wraps_at_33_bits() {
        let time = SpliceTime::from_ticks(PTS_MAX);
        assert_eq!(time.adjusted(2), Some(1));
        assert_eq!(SpliceTime::NotSpecified.adjusted(2), None);
    }

    #[test]
    fn break_duration_round_trips() {
        // auto_return, reserved, 5426421 ticks
        let bytes = [0xFE, 0x00, 0x52, 0xCC, 0xF5];
        let duration = BreakDuration::read_from(&mut BitReader::new(&bytes)).unwrap();
        assert!(duration.auto_return);
        assert_eq!(duration.duration, 5_426_421);
        assert_eq!(duration.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn break_duration_from_seconds() {
        let duration = BreakDuration::from_duration(Duration::from_secs(30), true).unwrap();
        assert_eq!(duration.duration, 2_700_000);
        assert_eq!(duration.to_duration(), Duration::from_secs(30));
    }
}
