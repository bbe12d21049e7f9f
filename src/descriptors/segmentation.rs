//! The segmentation descriptor (tag 0x02).
//!
//! Segmentation descriptors qualify a `time_signal` or `splice_insert` with
//! the kind of boundary it marks (program start, ad break end, chapter, ...)
//! and identify the content through a UPID.

use crate::bit_reader::BitReader;
use crate::bit_writer::{BitWriter, Encodable};
use crate::error::{DecodeResult, EncodeError, EncodeResult};
use crate::upid::{SegmentationUpid, SegmentationUpidType};
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Payload of a segmentation descriptor, after the "CUEI" identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentationDescriptor {
    pub segmentation_event_id: u32,
    /// `None` when `segmentation_event_cancel_indicator` is set.
    pub event: Option<SegmentationEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentationEvent {
    /// `None` when `delivery_not_restricted_flag` is set.
    pub delivery_restrictions: Option<DeliveryRestrictions>,
    /// `None` when `program_segmentation_flag` is set.
    pub components: Option<Vec<SegmentationComponent>>,
    /// Duration in 90 kHz ticks (40 bits on the wire).
    pub segmentation_duration: Option<u64>,
    pub upid: SegmentationUpid,
    pub segmentation_type: SegmentationType,
    pub segment_num: u8,
    pub segments_expected: u8,
    pub sub_segment: Option<SubSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeliveryRestrictions {
    pub web_delivery_allowed_flag: bool,
    pub no_regional_blackout_flag: bool,
    pub archive_allowed_flag: bool,
    pub device_restrictions: DeviceRestrictions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentationComponent {
    pub component_tag: u8,
    pub pts_offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubSegment {
    pub sub_segment_num: u8,
    pub sub_segments_expected: u8,
}

/// Device classes a segment is restricted for, as signalled by an
/// out-of-band message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum DeviceRestrictions {
    RestrictGroup0 = 0b00,
    RestrictGroup1 = 0b01,
    RestrictGroup2 = 0b10,
    None = 0b11,
}

impl From<u8> for DeviceRestrictions {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => DeviceRestrictions::RestrictGroup0,
            0b01 => DeviceRestrictions::RestrictGroup1,
            0b10 => DeviceRestrictions::RestrictGroup2,
            _ => DeviceRestrictions::None,
        }
    }
}

macro_rules! segmentation_types {
    ($($id:literal => $variant:ident, $name:literal;)+) => {
        /// The `segmentation_type_id` of a segmentation descriptor.
        ///
        /// Ids without an assigned meaning are kept in
        /// [`SegmentationType::Other`] so they re-encode unchanged.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(from = "u8", into = "u8"))]
        #[non_exhaustive]
        pub enum SegmentationType {
            $($variant,)+
            Other(u8),
        }

        impl SegmentationType {
            pub fn id(&self) -> u8 {
                match self {
                    $(SegmentationType::$variant => $id,)+
                    SegmentationType::Other(id) => *id,
                }
            }

            pub fn description(&self) -> &'static str {
                match self {
                    $(SegmentationType::$variant => $name,)+
                    SegmentationType::Other(_) => "Unknown",
                }
            }
        }

        impl From<u8> for SegmentationType {
            fn from(id: u8) -> Self {
                match id {
                    $($id => SegmentationType::$variant,)+
                    other => SegmentationType::Other(other),
                }
            }
        }
    };
}

segmentation_types! {
    0x00 => NotIndicated, "Not Indicated";
    0x01 => ContentIdentification, "Content Identification";
    0x10 => ProgramStart, "Program Start";
    0x11 => ProgramEnd, "Program End";
    0x12 => ProgramEarlyTermination, "Program Early Termination";
    0x13 => ProgramBreakaway, "Program Breakaway";
    0x14 => ProgramResumption, "Program Resumption";
    0x15 => ProgramRunoverPlanned, "Program Runover Planned";
    0x16 => ProgramRunoverUnplanned, "Program Runover Unplanned";
    0x17 => ProgramOverlapStart, "Program Overlap Start";
    0x18 => ProgramBlackoutOverride, "Program Blackout Override";
    0x19 => ProgramJoin, "Program Join";
    0x20 => ChapterStart, "Chapter Start";
    0x21 => ChapterEnd, "Chapter End";
    0x22 => BreakStart, "Break Start";
    0x23 => BreakEnd, "Break End";
    0x24 => OpeningCreditStart, "Opening Credit Start";
    0x25 => OpeningCreditEnd, "Opening Credit End";
    0x26 => ClosingCreditStart, "Closing Credit Start";
    0x27 => ClosingCreditEnd, "Closing Credit End";
    0x30 => ProviderAdvertisementStart, "Provider Advertisement Start";
    0x31 => ProviderAdvertisementEnd, "Provider Advertisement End";
    0x32 => DistributorAdvertisementStart, "Distributor Advertisement Start";
    0x33 => DistributorAdvertisementEnd, "Distributor Advertisement End";
    0x34 => ProviderPlacementOpportunityStart, "Provider Placement Opportunity Start";
    0x35 => ProviderPlacementOpportunityEnd, "Provider Placement Opportunity End";
    0x36 => DistributorPlacementOpportunityStart, "Distributor Placement Opportunity Start";
    0x37 => DistributorPlacementOpportunityEnd, "Distributor Placement Opportunity End";
    0x38 => ProviderOverlayPlacementOpportunityStart, "Provider Overlay Placement Opportunity Start";
    0x39 => ProviderOverlayPlacementOpportunityEnd, "Provider Overlay Placement Opportunity End";
    0x3A => DistributorOverlayPlacementOpportunityStart, "Distributor Overlay Placement Opportunity Start";
    0x3B => DistributorOverlayPlacementOpportunityEnd, "Distributor Overlay Placement Opportunity End";
    0x3C => ProviderPromoStart, "Provider Promo Start";
    0x3D => ProviderPromoEnd, "Provider Promo End";
    0x3E => DistributorPromoStart, "Distributor Promo Start";
    0x3F => DistributorPromoEnd, "Distributor Promo End";
    0x40 => UnscheduledEventStart, "Unscheduled Event Start";
    0x41 => UnscheduledEventEnd, "Unscheduled Event End";
    0x42 => AlternateContentOpportunityStart, "Alternate Content Opportunity Start";
    0x43 => AlternateContentOpportunityEnd, "Alternate Content Opportunity End";
    0x44 => ProviderAdBlockStart, "Provider Ad Block Start";
    0x45 => ProviderAdBlockEnd, "Provider Ad Block End";
    0x46 => DistributorAdBlockStart, "Distributor Ad Block Start";
    0x47 => DistributorAdBlockEnd, "Distributor Ad Block End";
    0x50 => NetworkStart, "Network Start";
    0x51 => NetworkEnd, "Network End";
}

impl SegmentationType {
    /// Whether descriptors of this type may carry `sub_segment_num` and
    /// `sub_segments_expected`.
    pub fn has_sub_segments(&self) -> bool {
        matches!(self.id(), 0x30 | 0x32 | 0x34 | 0x36 | 0x38 | 0x3A | 0x44 | 0x46)
    }
}

impl From<SegmentationType> for u8 {
    fn from(value: SegmentationType) -> Self {
        value.id()
    }
}

impl Default for SegmentationType {
    fn default() -> Self {
        SegmentationType::NotIndicated
    }
}

impl Display for SegmentationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02x})", self.description(), self.id())
    }
}

impl SegmentationDescriptor {
    pub fn segmentation_event_cancel_indicator(&self) -> bool {
        self.event.is_none()
    }

    pub fn segmentation_type(&self) -> Option<SegmentationType> {
        self.event.as_ref().map(|event| event.segmentation_type)
    }

    /// Reads the descriptor body that follows the identifier.
    pub(crate) fn read_from(reader: &mut BitReader) -> DecodeResult<Self> {
        let segmentation_event_id = reader.read_u32()?;
        let cancelled = reader.read_bool()?;
        reader.read_reserved(7)?;
        if cancelled {
            return Ok(SegmentationDescriptor {
                segmentation_event_id,
                event: None,
            });
        }

        let program_segmentation_flag = reader.read_bool()?;
        let segmentation_duration_flag = reader.read_bool()?;
        let delivery_not_restricted_flag = reader.read_bool()?;
        let delivery_restrictions = if delivery_not_restricted_flag {
            reader.read_reserved(5)?;
            None
        } else {
            Some(DeliveryRestrictions {
                web_delivery_allowed_flag: reader.read_bool()?,
                no_regional_blackout_flag: reader.read_bool()?,
                archive_allowed_flag: reader.read_bool()?,
                device_restrictions: DeviceRestrictions::from(reader.read_bits(2)? as u8),
            })
        };

        let components = if program_segmentation_flag {
            None
        } else {
            let component_count = reader.read_u8()?;
            let mut components = Vec::with_capacity(component_count as usize);
            for _ in 0..component_count {
                let component_tag = reader.read_u8()?;
                reader.read_reserved(7)?;
                components.push(SegmentationComponent {
                    component_tag,
                    pts_offset: reader.read_bits(33)?,
                });
            }
            Some(components)
        };

        let segmentation_duration = if segmentation_duration_flag {
            Some(reader.read_bits(40)?)
        } else {
            None
        };

        let upid_type = SegmentationUpidType::from(reader.read_u8()?);
        let upid_length = reader.read_u8()? as usize;
        let upid = SegmentationUpid::new(upid_type, reader.read_bytes(upid_length)?);

        let segmentation_type = SegmentationType::from(reader.read_u8()?);
        let segment_num = reader.read_u8()?;
        let segments_expected = reader.read_u8()?;

        // older encoders omit the sub-segment fields even for types that allow them
        let sub_segment = if segmentation_type.has_sub_segments() && reader.remaining_bytes() >= 2
        {
            Some(SubSegment {
                sub_segment_num: reader.read_u8()?,
                sub_segments_expected: reader.read_u8()?,
            })
        } else {
            None
        };

        Ok(SegmentationDescriptor {
            segmentation_event_id,
            event: Some(SegmentationEvent {
                delivery_restrictions,
                components,
                segmentation_duration,
                upid,
                segmentation_type,
                segment_num,
                segments_expected,
                sub_segment,
            }),
        })
    }
}

impl Encodable for SegmentationDescriptor {
    fn encode(&self, writer: &mut BitWriter) -> EncodeResult<()> {
        writer.write_bits(u64::from(self.segmentation_event_id), 32)?;
        writer.write_bool(self.event.is_none())?;
        writer.write_reserved(7)?;
        let Some(event) = &self.event else {
            return Ok(());
        };

        writer.write_bool(event.components.is_none())?;
        writer.write_bool(event.segmentation_duration.is_some())?;
        writer.write_bool(event.delivery_restrictions.is_none())?;
        match &event.delivery_restrictions {
            Some(restrictions) => {
                writer.write_bool(restrictions.web_delivery_allowed_flag)?;
                writer.write_bool(restrictions.no_regional_blackout_flag)?;
                writer.write_bool(restrictions.archive_allowed_flag)?;
                writer.write_bits(restrictions.device_restrictions as u64, 2)?;
            }
            None => writer.write_reserved(5)?,
        }

        if let Some(components) = &event.components {
            writer.write_field("component_count", components.len() as u64, 8)?;
            for component in components {
                writer.write_bits(u64::from(component.component_tag), 8)?;
                writer.write_reserved(7)?;
                writer.write_field("pts_offset", component.pts_offset, 33)?;
            }
        }

        if let Some(duration) = event.segmentation_duration {
            writer.write_field("segmentation_duration", duration, 40)?;
        }

        writer.write_bits(u64::from(u8::from(event.upid.upid_type)), 8)?;
        writer.write_field("segmentation_upid_length", event.upid.value.len() as u64, 8)?;
        writer.write_bytes(&event.upid.value)?;

        writer.write_bits(u64::from(event.segmentation_type.id()), 8)?;
        writer.write_bits(u64::from(event.segment_num), 8)?;
        writer.write_bits(u64::from(event.segments_expected), 8)?;

        if let Some(sub_segment) = &event.sub_segment {
            if !event.segmentation_type.has_sub_segments() {
                return Err(EncodeError::InconsistentField {
                    field: "sub_segment",
                    reason: "segmentation type does not carry sub-segments",
                });
            }
            writer.write_bits(u64::from(sub_segment.sub_segment_num), 8)?;
            writer.write_bits(u64::from(sub_segment.sub_segments_expected), 8)?;
        }
        Ok(())
    }
}
