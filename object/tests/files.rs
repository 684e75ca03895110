//! Whole-file round trip tests across the native transfer syntaxes.

use dcmio_core::{DataElement, DataSet, DicomValue, PrimitiveValue, Tag, VR};
use dcmio_encoding::transfer_syntax::{
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN,
    IMPLICIT_VR_LITTLE_ENDIAN,
};
use dcmio_object::{DecodeOptions, DicomFile, EncodeOptions};
use smallvec::smallvec;

fn sample_dataset() -> DataSet {
    let mut ds = DataSet::new();
    ds.put(DataElement::new(
        Tag(0x0008, 0x0016),
        VR::UI,
        "1.2.840.10008.5.1.4.1.1.4",
    ));
    ds.put(DataElement::new(Tag(0x0008, 0x0018), VR::UI, "1.2.3.4.5"));
    ds.put(DataElement::new(Tag(0x0008, 0x0060), VR::CS, "MR"));
    ds.put(DataElement::new(
        Tag(0x0008, 0x0008),
        VR::CS,
        vec!["ORIGINAL", "PRIMARY"],
    ));
    ds.put(DataElement::new(Tag(0x0010, 0x0010), VR::PN, "Doe^John"));
    ds.put(DataElement::new(
        Tag(0x0020, 0x0032),
        VR::DS,
        PrimitiveValue::F64(smallvec![-37.5, 11.0, 0.25]),
    ));
    ds.put(DataElement::new(
        Tag(0x0028, 0x0010),
        VR::US,
        PrimitiveValue::U16(smallvec![4]),
    ));
    ds.put(DataElement::new(
        Tag(0x0028, 0x0011),
        VR::US,
        PrimitiveValue::U16(smallvec![4]),
    ));
    ds.put(DataElement::new(
        Tag(0x7FE0, 0x0010),
        VR::OW,
        PrimitiveValue::U8(smallvec![0, 1, 2, 3, 4, 5, 6, 7]),
    ));
    ds
}

fn roundtrip(uid: &str) -> DicomFile {
    let file = DicomFile::new(sample_dataset(), uid);
    let bytes = file.to_bytes(&EncodeOptions::new()).unwrap();
    DicomFile::from_bytes(&bytes, &DecodeOptions::new()).unwrap()
}

#[test]
fn roundtrip_explicit_vr_little_endian() {
    let back = roundtrip(EXPLICIT_VR_LITTLE_ENDIAN);
    assert_eq!(back.dataset, sample_dataset());
    assert_eq!(back.transfer_syntax_uid(), Some(EXPLICIT_VR_LITTLE_ENDIAN));
}

#[test]
fn roundtrip_implicit_vr_little_endian() {
    let back = roundtrip(IMPLICIT_VR_LITTLE_ENDIAN);
    // every sampled attribute is in the dictionary,
    // so the VRs survive the implicit encoding
    assert_eq!(back.dataset, sample_dataset());
}

#[test]
fn roundtrip_explicit_vr_big_endian() {
    let back = roundtrip(EXPLICIT_VR_BIG_ENDIAN);
    assert_eq!(back.dataset, sample_dataset());
}

#[test]
fn roundtrip_deflated() {
    let file = DicomFile::new(sample_dataset(), DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN);
    let bytes = file.to_bytes(&EncodeOptions::new()).unwrap();
    let back = DicomFile::from_bytes(&bytes, &DecodeOptions::new()).unwrap();
    assert_eq!(back.dataset, sample_dataset());
    assert_eq!(
        back.transfer_syntax_uid(),
        Some(DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN)
    );
    // the data set bytes past the meta group are not a plain encoding
    let plain = DicomFile::new(sample_dataset(), EXPLICIT_VR_LITTLE_ENDIAN)
        .to_bytes(&EncodeOptions::new())
        .unwrap();
    assert_ne!(bytes.len(), plain.len());
}

#[test]
fn roundtrip_nested_sequences() {
    let mut inner = DataSet::new();
    inner.put(DataElement::new(Tag(0x0008, 0x0100), VR::SH, "121327"));
    let mut middle = DataSet::new();
    middle.put(DataElement::new(
        Tag(0x0040, 0xA730),
        VR::SQ,
        DicomValue::new_sequence(vec![inner]),
    ));
    let mut ds = DataSet::new();
    ds.put(DataElement::new(
        Tag(0x0040, 0xA730),
        VR::SQ,
        DicomValue::new_sequence(vec![middle, DataSet::new()]),
    ));

    for uid in [
        EXPLICIT_VR_LITTLE_ENDIAN,
        IMPLICIT_VR_LITTLE_ENDIAN,
        EXPLICIT_VR_BIG_ENDIAN,
    ] {
        let file = DicomFile::new(ds.clone(), uid);
        let bytes = file.to_bytes(&EncodeOptions::new()).unwrap();
        let back = DicomFile::from_bytes(&bytes, &DecodeOptions::new()).unwrap();
        assert_eq!(back.dataset, ds, "transfer syntax {}", uid);
    }
}

#[test]
fn roundtrip_encapsulated_pixel_data() {
    let frames = vec![vec![1u8, 2, 3, 4, 5, 6], vec![7u8, 8]];
    let mut ds = DataSet::new();
    ds.put(DataElement::new(
        Tag(0x7FE0, 0x0010),
        VR::OB,
        DicomValue::new_pixel_sequence(frames.clone()),
    ));
    let file = DicomFile::new(ds, EXPLICIT_VR_LITTLE_ENDIAN);
    let bytes = file.to_bytes(&EncodeOptions::new()).unwrap();
    let back = DicomFile::from_bytes(&bytes, &DecodeOptions::new()).unwrap();
    let element = back.dataset.element(Tag(0x7FE0, 0x0010)).unwrap();
    assert_eq!(element.vr(), VR::OB);
    assert_eq!(element.value().fragments().unwrap(), frames.as_slice());
}

#[test]
fn roundtrip_encapsulated_with_fragmentation() {
    let frames = vec![vec![9u8; 10]];
    let mut ds = DataSet::new();
    ds.put(DataElement::new(
        Tag(0x7FE0, 0x0010),
        VR::OB,
        DicomValue::new_pixel_sequence(frames.clone()),
    ));
    let file = DicomFile::new(ds, EXPLICIT_VR_LITTLE_ENDIAN);
    let options = EncodeOptions {
        pixel_fragment_size: Some(4),
        ..EncodeOptions::new()
    };
    let bytes = file.to_bytes(&options).unwrap();
    let back = DicomFile::from_bytes(&bytes, &DecodeOptions::new()).unwrap();
    // the three fragments reassemble into the single frame
    assert_eq!(
        back.dataset
            .element(Tag(0x7FE0, 0x0010))
            .unwrap()
            .value()
            .fragments()
            .unwrap(),
        frames.as_slice()
    );
}

#[test]
fn meta_group_length_matches_content() {
    let file = DicomFile::new(sample_dataset(), EXPLICIT_VR_LITTLE_ENDIAN);
    let bytes = file.to_bytes(&EncodeOptions::new()).unwrap();
    let declared = u32::from_le_bytes([bytes[140], bytes[141], bytes[142], bytes[143]]) as usize;
    // the data set starts right after the declared meta extent
    let dataset_start = 144 + declared;
    // first data set element is (0008,0008)
    assert_eq!(&bytes[dataset_start..dataset_start + 4], &[0x08, 0x00, 0x08, 0x00]);
}

#[test]
fn unique_identifiers_are_nul_padded() {
    let mut ds = DataSet::new();
    ds.put(DataElement::new(Tag(0x0008, 0x0018), VR::UI, "1.2.3"));
    let file = DicomFile::new(ds, EXPLICIT_VR_LITTLE_ENDIAN);
    let bytes = file.to_bytes(&EncodeOptions::new()).unwrap();
    let needle = b"1.2.3\0";
    assert!(
        bytes.windows(needle.len()).any(|w| w == needle),
        "odd UI value must be padded with NUL"
    );
}

#[test]
fn unknown_transfer_syntax_falls_back_to_explicit_le() {
    let file = DicomFile::new(sample_dataset(), EXPLICIT_VR_LITTLE_ENDIAN);
    let mut bytes = file.to_bytes(&EncodeOptions::new()).unwrap();
    // rewrite the declared UID to an unknown one of the same length
    let uid = EXPLICIT_VR_LITTLE_ENDIAN.as_bytes();
    let pos = bytes
        .windows(uid.len())
        .position(|w| w == uid)
        .expect("transfer syntax UID present");
    bytes[pos..pos + uid.len()].copy_from_slice(b"1.2.840.10008.9.9.9");
    let back = DicomFile::from_bytes(&bytes, &DecodeOptions::new()).unwrap();
    assert_eq!(back.dataset, sample_dataset());
}

#[test]
fn lenient_read_of_truncated_file() {
    let file = DicomFile::new(sample_dataset(), EXPLICIT_VR_LITTLE_ENDIAN);
    let bytes = file.to_bytes(&EncodeOptions::new()).unwrap();
    let truncated = &bytes[..bytes.len() - 4];
    assert!(DicomFile::from_bytes(truncated, &DecodeOptions::new()).is_err());
    let back = DicomFile::from_bytes(truncated, &DecodeOptions::new().ignore_errors()).unwrap();
    // everything but the cut-off pixel data element survives
    assert!(!back.dataset.contains(Tag(0x7FE0, 0x0010)));
    assert_eq!(back.dataset.string_value(Tag(0x0010, 0x0010)), Some("Doe^John"));
}
