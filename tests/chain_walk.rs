//! Traversal of the directory chain: ordering, termination, loops.

use std::io::Cursor;

use exifread::{parse, Decoder, ExifError, ExifFormatError, IfdLabel, Mode, Value, Warning};

fn le_entry(tag: u16, type_: u16, count: u32, value: [u8; 4]) -> Vec<u8> {
    let mut e = Vec::with_capacity(12);
    e.extend_from_slice(&tag.to_le_bytes());
    e.extend_from_slice(&type_.to_le_bytes());
    e.extend_from_slice(&count.to_le_bytes());
    e.extend_from_slice(&value);
    e
}

fn le_header() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"II");
    data.extend_from_slice(&42u16.to_le_bytes());
    data.extend_from_slice(&8u32.to_le_bytes());
    data
}

fn push_ifd(data: &mut Vec<u8>, entries: &[Vec<u8>], next: u32) -> u32 {
    let offset = data.len() as u32;
    data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for e in entries {
        data.extend_from_slice(e);
    }
    data.extend_from_slice(&next.to_le_bytes());
    offset
}

#[test]
fn chain_walks_in_order_and_stops_at_zero() {
    let mut data = le_header();
    push_ifd(&mut data, &[le_entry(256, 3, 1, [1, 0, 0, 0])], 26);
    push_ifd(&mut data, &[le_entry(256, 3, 1, [2, 0, 0, 0])], 0);

    let metadata = parse(Cursor::new(data), 0).unwrap();
    let labels: Vec<IfdLabel> = metadata.directories.iter().map(|d| d.label()).collect();
    assert_eq!(labels, [IfdLabel::Ifd(0), IfdLabel::Ifd(1)]);
    assert_eq!(
        metadata.find(IfdLabel::Ifd(1), 256),
        Some(&Value::Unsigned(vec![2]))
    );
    assert!(metadata.warnings.is_empty());
}

#[test]
fn empty_directory_decodes() {
    let mut data = le_header();
    push_ifd(&mut data, &[], 0);

    let metadata = parse(Cursor::new(data), 0).unwrap();
    assert_eq!(metadata.directories.len(), 1);
    assert!(metadata.directories[0].is_empty());
}

#[test]
fn self_referential_next_pointer_terminates() {
    let mut data = le_header();
    push_ifd(&mut data, &[], 8);

    let metadata = parse(Cursor::new(data), 0).unwrap();
    assert_eq!(metadata.directories.len(), 1);
    assert!(metadata
        .warnings
        .contains(&Warning::LoopDetected { offset: 8 }));
}

#[test]
fn two_directory_cycle_terminates() {
    let mut data = le_header();
    push_ifd(&mut data, &[], 14);
    push_ifd(&mut data, &[], 8);

    let metadata = parse(Cursor::new(data), 0).unwrap();
    // Both directories decode once; the walk stops on the revisit.
    assert_eq!(metadata.directories.len(), 2);
    assert!(metadata
        .warnings
        .contains(&Warning::LoopDetected { offset: 8 }));
}

#[test]
fn sub_directory_pointer_into_the_chain_is_skipped() {
    let mut data = le_header();
    // The Exif pointer aims back at IFD0 itself.
    push_ifd(&mut data, &[le_entry(0x8769, 4, 1, 8u32.to_le_bytes())], 0);

    let metadata = parse(Cursor::new(data), 0).unwrap();
    assert!(metadata.directory(IfdLabel::Exif).is_none());
    assert_eq!(metadata.directories.len(), 1);
    assert!(metadata
        .warnings
        .contains(&Warning::LoopDetected { offset: 8 }));
}

#[test]
fn next_pointer_past_eof_keeps_earlier_directories() {
    let mut data = le_header();
    push_ifd(&mut data, &[le_entry(256, 3, 1, [1, 0, 0, 0])], 0x4000);

    let metadata = parse(Cursor::new(data.clone()), 0).unwrap();
    assert_eq!(metadata.directories.len(), 1);
    assert!(matches!(
        metadata.warnings.as_slice(),
        [Warning::TruncatedData {
            ifd: IfdLabel::Ifd(1),
            ..
        }]
    ));

    let err = Decoder::new(Cursor::new(data), 0)
        .with_mode(Mode::Strict)
        .read_metadata()
        .unwrap_err();
    assert!(matches!(
        err,
        ExifError::Format(ExifFormatError::TruncatedData(..))
    ));
}

#[test]
fn truncated_next_pointer_keeps_the_directory() {
    // The file ends right after the last entry, where the trailing 4-byte
    // next-IFD pointer should be.
    let mut data = le_header();
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&le_entry(256, 3, 1, [1, 0, 0, 0]));

    let metadata = parse(Cursor::new(data.clone()), 0).unwrap();
    assert_eq!(metadata.directories.len(), 1);
    assert_eq!(
        metadata.find(IfdLabel::Ifd(0), 256),
        Some(&Value::Unsigned(vec![1]))
    );
    assert!(metadata.warnings.contains(&Warning::TruncatedData {
        ifd: IfdLabel::Ifd(0),
        offset: 22,
        expected: 4,
    }));

    let err = Decoder::new(Cursor::new(data), 0)
        .with_mode(Mode::Strict)
        .read_metadata()
        .unwrap_err();
    assert!(matches!(
        err,
        ExifError::Format(ExifFormatError::TruncatedData(..))
    ));
}

#[test]
fn chain_longer_than_the_index_width_is_cut_off() {
    let mut data = le_header();
    let total = 70_000u32;
    for i in 0..total {
        let next = if i + 1 == total { 0 } else { 8 + 6 * (i + 1) };
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&next.to_le_bytes());
    }

    let metadata = parse(Cursor::new(data), 0).unwrap();
    assert_eq!(metadata.directories.len(), 65_536);
}

#[test]
fn undecodable_sub_directory_keeps_the_chain() {
    let mut data = le_header();
    // The GPS pointer aims far past the end of the source.
    push_ifd(&mut data, &[le_entry(0x8825, 4, 1, 0x4000u32.to_le_bytes())], 0);

    let metadata = parse(Cursor::new(data), 0).unwrap();
    assert!(metadata.directory(IfdLabel::Gps).is_none());
    assert_eq!(metadata.directories.len(), 1);
    assert!(matches!(
        metadata.warnings.as_slice(),
        [Warning::TruncatedData {
            ifd: IfdLabel::Gps,
            ..
        }]
    ));
}
