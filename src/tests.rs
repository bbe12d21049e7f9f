use super::*;
use crate::error::DescriptorIssue;
use data_encoding::BASE64;
use std::time::Duration;

fn payload(base64: &str) -> Vec<u8> {
    BASE64
        .decode(base64.as_bytes())
        .expect("Failed to decode base64 string")
}

fn segmentation(descriptor: &SpliceDescriptor) -> &SegmentationDescriptor {
    match descriptor {
        SpliceDescriptor::Segmentation(segmentation) => segmentation,
        other => panic!("expected a segmentation descriptor, got {other:?}"),
    }
}

#[test]
fn test_time_signal_command() {
    let section = decode(&payload("/DAWAAAAAAAAAP/wBQb+Qjo1vQAAuwxz9A==")).unwrap();

    assert_eq!(section.table_id, 0xFC);
    assert_eq!(section.section_length, 22);
    assert_eq!(section.sap_type, SAPType::NotSpecified);
    assert_eq!(section.tier, 0xFFF);
    assert_eq!(section.splice_command_length, 5);
    assert_eq!(section.splice_command_type(), SpliceCommandType::TimeSignal);
    assert!(section.descriptors.is_empty());
    assert_eq!(section.crc32, 0xbb0c_73f4);

    match &section.splice_command {
        SpliceCommand::TimeSignal(signal) => {
            assert!(signal.splice_time.time_specified_flag());
            assert_eq!(signal.splice_time.pts_time(), Some(1_111_111_101));
            let duration = signal.splice_time.to_duration().unwrap();
            assert_eq!(duration.as_secs(), 12_345);
        }
        other => panic!("expected time_signal, got {other:?}"),
    }
}

#[test]
fn test_splice_null_command() {
    let section = decode(&payload("/DARAAAAAAAAAP/wAAAAAHpPv/8=")).unwrap();
    assert_eq!(section.splice_command, SpliceCommand::SpliceNull);
    assert_eq!(section.section_length, 17);
    assert_eq!(section.splice_command_length, 0);
    assert_eq!(section.crc32, 0x7a4f_bfff);
}

#[test]
fn test_splice_insert_with_break_duration() {
    let section = decode(&payload(
        "/DAvAAAAAAAA///wFAVIAACPf+/+c2nALv4AUsz1AAAAAAAKAAhDVUVJAAABNWLbowo=",
    ))
    .unwrap();

    assert_eq!(section.cw_index, 0xFF);
    assert_eq!(section.splice_command_length, 20);

    let SpliceCommand::SpliceInsert(insert) = &section.splice_command else {
        panic!("expected splice_insert, got {:?}", section.splice_command);
    };
    assert_eq!(insert.splice_event_id, 0x4800_008f);
    assert!(!insert.splice_event_cancel_indicator());
    assert!(insert.program_splice_flag());
    assert!(insert.duration_flag());

    let event = insert.event.as_ref().unwrap();
    assert!(event.out_of_network_indicator);
    assert!(!event.splice_immediate_flag);
    assert_eq!(
        event.timing,
        SpliceInsertTiming::Program {
            splice_time: Some(SpliceTime::from_ticks(1_936_310_318)),
        }
    );
    let duration = event.break_duration.unwrap();
    assert!(duration.auto_return);
    assert_eq!(duration.duration, 5_426_421);
    assert_eq!(duration.to_duration().as_secs(), 60);
    assert_eq!(event.unique_program_id, 0);
    assert_eq!((event.avail_num, event.avails_expected), (0, 0));

    assert_eq!(
        section.descriptors,
        vec![SpliceDescriptor::Avail {
            provider_avail_id: 0x135
        }]
    );
}

#[test]
fn test_splice_insert_avail_counters() {
    let section =
        decode(&payload("/DAlAAAAAAAAAP/wFAUAAAAEf+/+kybGyP4BSvaQAAEBAQAArky/3g==")).unwrap();

    let SpliceCommand::SpliceInsert(insert) = &section.splice_command else {
        panic!("expected splice_insert");
    };
    assert_eq!(insert.splice_event_id, 4);
    let event = insert.event.as_ref().unwrap();
    assert_eq!(
        event.timing,
        SpliceInsertTiming::Program {
            splice_time: Some(SpliceTime::from_ticks(2_468_792_008)),
        }
    );
    assert_eq!(event.break_duration.unwrap().duration, 21_690_000);
    assert_eq!(event.unique_program_id, 1);
    assert_eq!(event.avail_num, 1);
    assert_eq!(event.avails_expected, 1);
}

#[test]
fn test_splice_insert_without_duration() {
    let section =
        decode(&payload("/DAqAAAAAAAAAP/wDwUAAHn+f8/+QubGOQAAAAAACgAIQ1VFSQAAAADizteX")).unwrap();

    let SpliceCommand::SpliceInsert(insert) = &section.splice_command else {
        panic!("expected splice_insert");
    };
    assert_eq!(insert.splice_event_id, 31_230);
    assert!(!insert.duration_flag());
    assert_eq!(section.splice_command_length, 15);
    assert_eq!(
        section.descriptors,
        vec![SpliceDescriptor::Avail {
            provider_avail_id: 0
        }]
    );
}

#[test]
fn test_time_signal_with_avail_descriptor() {
    let section = decode(&payload("/DAgAAAAAAAAAP/wBQb+Qjo1vQAKAAhDVUVJAAAE0iVuWvA=")).unwrap();
    assert_eq!(
        section.descriptors,
        vec![SpliceDescriptor::Avail {
            provider_avail_id: 1234
        }]
    );
}

#[test]
fn test_placement_opportunity_start_with_sub_segments() {
    let section = decode(&payload(
        "/DA2AAAAAAAA///wBQb+cr0AUAAgAh5DVUVJSAAAjn/PAAGlmbAICAAAAAAsoKGKNAIAmsm2waDx",
    ))
    .unwrap();

    assert_eq!(section.descriptors.len(), 1);
    let descriptor = segmentation(&section.descriptors[0]);
    assert_eq!(descriptor.segmentation_event_id, 0x4800_008e);
    assert!(!descriptor.segmentation_event_cancel_indicator());

    let event = descriptor.event.as_ref().unwrap();
    assert_eq!(
        event.segmentation_type,
        SegmentationType::ProviderPlacementOpportunityStart
    );
    assert_eq!(event.segmentation_duration, Some(27_630_000));
    assert_eq!(event.components, None);
    assert_eq!(
        event.delivery_restrictions,
        Some(DeliveryRestrictions {
            web_delivery_allowed_flag: false,
            no_regional_blackout_flag: true,
            archive_allowed_flag: true,
            device_restrictions: DeviceRestrictions::None,
        })
    );
    assert_eq!(event.upid.upid_type, SegmentationUpidType::AiringID);
    assert_eq!(
        event.upid.value,
        vec![0x00, 0x00, 0x00, 0x00, 0x2c, 0xa0, 0xa1, 0x8a]
    );
    assert_eq!((event.segment_num, event.segments_expected), (2, 0));
    assert_eq!(
        event.sub_segment,
        Some(SubSegment {
            sub_segment_num: 154,
            sub_segments_expected: 201,
        })
    );
}

#[test]
fn test_placement_opportunity_end() {
    let section = decode(&payload(
        "/DAvAAAAAAAA///wBQb+dGKQoAAZAhdDVUVJSAAAjn+fCAgAAAAALKChijUCAKnMZ1g=",
    ))
    .unwrap();

    let descriptor = segmentation(&section.descriptors[0]);
    let event = descriptor.event.as_ref().unwrap();
    assert_eq!(
        event.segmentation_type,
        SegmentationType::ProviderPlacementOpportunityEnd
    );
    assert_eq!(event.segmentation_duration, None);
    assert_eq!(event.sub_segment, None);
    assert!(event.delivery_restrictions.unwrap().web_delivery_allowed_flag);
}

#[test]
fn test_sub_segment_fields_absent_when_payload_ends() {
    let section =
        decode(&payload("/DAnAAAAAAAAAP/wBQb+AA27oAARAg9DVUVJAAAAAX+HCQA0AAE0xUZn")).unwrap();

    let SpliceCommand::TimeSignal(signal) = &section.splice_command else {
        panic!("expected time_signal");
    };
    assert_eq!(signal.splice_time.pts_time(), Some(900_000));

    let event = segmentation(&section.descriptors[0]).event.as_ref().unwrap();
    assert_eq!(
        event.segmentation_type,
        SegmentationType::ProviderPlacementOpportunityStart
    );
    assert_eq!(event.sub_segment, None);
}

#[test]
fn test_multiple_segmentation_descriptors() {
    let section = decode(&payload(
        "/DBIAAAAAAAAAP/wBQb/tB67hgAyAhdDVUVJQAABEn+fCAgAAAAALzE8BTUAAAIXQ1VFSUAAAEV/nwgIAAAAAC8xPN4jAAAfiOPE",
    ))
    .unwrap();

    let SpliceCommand::TimeSignal(signal) = &section.splice_command else {
        panic!("expected time_signal");
    };
    assert_eq!(signal.splice_time.pts_time(), Some(7_316_880_262));

    let types: Vec<_> = section
        .descriptors
        .iter()
        .map(|descriptor| segmentation(descriptor).segmentation_type())
        .collect();
    assert_eq!(
        types,
        vec![
            Some(SegmentationType::ProviderPlacementOpportunityEnd),
            Some(SegmentationType::BreakEnd),
        ]
    );
    assert_eq!(segmentation(&section.descriptors[0]).segmentation_event_id, 0x4000_0112);
    assert_eq!(segmentation(&section.descriptors[1]).segmentation_event_id, 0x4000_0045);
}

#[test]
fn test_three_segmentation_descriptors() {
    let section = decode(&payload(
        "/DBhAAAAAAAA///wBQb+qM1E7QBLAhdDVUVJSAAArX+fCAgAAAAALLLXnTUCAAIXQ1VFSUgAACZ/nwgIAAAAACyy150RAAACF0NVRUlIAAAnf58ICAAAAAAsstezEAAAihiGnw==",
    ))
    .unwrap();

    assert_eq!(section.descriptors.len(), 3);
    assert!(section.descriptor_issues().is_empty());
    assert_eq!(
        segmentation(&section.descriptors[2]).segmentation_type(),
        Some(SegmentationType::ProgramStart)
    );
}

#[test]
fn test_managed_private_upid() {
    let section = decode(&payload(
        "/DA4AAAAAAAAAP/wBQb+tTeaawAiAiBDVUVJAAAKqH+/DBFNRFNOQjAwMTEzMjIxOTJfTjUAAIiGK1s=",
    ))
    .unwrap();

    let descriptor = segmentation(&section.descriptors[0]);
    assert_eq!(descriptor.segmentation_event_id, 2728);
    let event = descriptor.event.as_ref().unwrap();
    assert_eq!(event.delivery_restrictions, None);
    assert_eq!(event.upid.upid_type, SegmentationUpidType::MPU);
    assert_eq!(event.upid.value, b"MDSNB0011322192_N");
    assert_eq!(
        event.segmentation_type,
        SegmentationType::ProviderPlacementOpportunityEnd
    );
}

#[test]
fn test_truncated_upid_is_kept_raw() {
    let bytes = payload(
        "/DBDAAAAAAAA///wBQb+AA2QOQAtAitDVUVJAAAAA3+/BCAwNjBhMmIzNC4wMTAxMDEwNS4wMTAxMGQyMC4xEAEBRKI3vg==",
    );
    let section = decode(&bytes).unwrap();

    let SpliceCommand::TimeSignal(signal) = &section.splice_command else {
        panic!("expected time_signal");
    };
    assert_eq!(signal.splice_time.pts_time(), Some(888_889));

    let issues = section.descriptor_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].tag, 0x02);
    assert_eq!(issues[0].data.len(), 0x2b);
    assert!(matches!(issues[0].issue, DescriptorIssue::Truncated { .. }));
}

#[test]
fn test_crc_mismatch_keeps_section() {
    let bytes = payload(
        "/DA4AAAAAAAA///wBQb+AKpFLgAiAiBDVUVJAAAAA3//AAApPWwDDEFCQ0QwMTIzNDU2SHAAAFkTm+A=",
    );
    let err = decode(&bytes).unwrap_err();

    let DecodeError::CrcMismatch {
        computed, declared, ..
    } = &err
    else {
        panic!("expected a CRC mismatch, got {err:?}");
    };
    assert_eq!(*declared, 0x5913_9be0);
    assert_eq!(*computed, 0x5b7a_57d8);
    assert!(err.is_recoverable());

    let section = err.into_section().unwrap();
    assert_eq!(section.crc32, 0x5913_9be0);
    let event = segmentation(&section.descriptors[0]).event.as_ref().unwrap();
    assert_eq!(event.upid.upid_type, SegmentationUpidType::AdID);
    assert_eq!(event.upid.to_string(), "ABCD0123456H");
}

#[test]
fn test_crc_mismatch_ignored_when_not_verifying() {
    let bytes = payload(
        "/DA4AAAAAAAA///wBQb+AKpFLgAiAiBDVUVJAAAAA3//AAApPWwDDEFCQ0QwMTIzNDU2SHAAAFkTm+A=",
    );
    let section = decode_with(&bytes, &DecodeOptions::default().verify_crc(false)).unwrap();
    assert_eq!(section.splice_command_type(), SpliceCommandType::TimeSignal);
}

#[test]
fn test_pts_adjustment_applies_modulo_33_bits() {
    let time = SpliceTime::from_ticks(0x1_FFFF_FFF0);
    assert_eq!(time.adjusted(0x20), Some(0x10));
    assert_eq!(SpliceTime::NotSpecified.adjusted(0x20), None);
}

#[test]
fn test_clock_time_conversions() {
    assert_eq!(Duration::from_secs(1).as_90k(), 90_000);
    assert_eq!(ticks_to_secs(5_426_421), 60.293567);
}
