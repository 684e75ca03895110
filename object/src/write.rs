//! Writing whole data sets into in-memory buffers.
//!
//! Elements are written in ascending tag order, as the data set
//! container already keeps them. Sequences are always written with an
//! undefined length and explicit delimiters, so no scratch buffer is
//! needed for nested content. Encapsulated pixel data is refragmented
//! from its in-memory frames and receives a rebuilt offset table.

use dcmio_core::{DataSet, DicomValue, Length, Tag, VR};
use dcmio_encoding::cursor::WriteCursor;
use dcmio_encoding::encode::{
    encode_header, encode_item_delimiter, encode_item_header, encode_sequence_delimiter,
};
use dcmio_encoding::text::{SpecificCharacterSet, TextCodec};
use dcmio_encoding::value_write::{encode_value, fragment_frame};
use dcmio_encoding::{EncodeOptions, TransferSyntax};
use snafu::ResultExt;
use tracing::warn;

use crate::{EncodeElementSnafu, WriteError};

type Result<T, E = WriteError> = std::result::Result<T, E>;

/// Write a whole data set to the cursor under the given transfer syntax.
///
/// Text is encoded per the data set's own
/// Specific Character Set (0008,0005) declaration;
/// without one, the default repertoire applies.
/// The cursor's endianness must match the transfer syntax.
pub fn write_data_set(
    dataset: &DataSet,
    cursor: &mut WriteCursor,
    ts: TransferSyntax,
    options: &EncodeOptions,
) -> Result<()> {
    let charset = charset_of(dataset, SpecificCharacterSet::default());
    write_elements(dataset, cursor, ts, options, charset)
}

/// The character set declared by the data set,
/// or the given one when there is no (usable) declaration.
fn charset_of(dataset: &DataSet, fallback: SpecificCharacterSet) -> SpecificCharacterSet {
    let name = match dataset.string_value(Tag::SPECIFIC_CHARACTER_SET) {
        Some(name) => name,
        None => return fallback,
    };
    SpecificCharacterSet::from_code(name).unwrap_or_else(|| {
        warn!(
            "unsupported character set `{}` declared, writing text as {}",
            name,
            SpecificCharacterSet::IsoIr192.name()
        );
        SpecificCharacterSet::IsoIr192
    })
}

fn write_elements(
    dataset: &DataSet,
    cursor: &mut WriteCursor,
    ts: TransferSyntax,
    options: &EncodeOptions,
    charset: SpecificCharacterSet,
) -> Result<()> {
    for element in dataset.iter() {
        let tag = element.tag();
        match element.value() {
            DicomValue::Primitive(value) => {
                let bytes = encode_value(element.vr(), value, cursor.endianness(), charset, options)
                    .context(EncodeElementSnafu { tag })?;
                encode_header(cursor, tag, element.vr(), Length(bytes.len() as u32), ts)
                    .context(EncodeElementSnafu { tag })?;
                cursor.write_bytes(&bytes);
            }
            DicomValue::Sequence { items } => {
                encode_header(cursor, tag, VR::SQ, Length::UNDEFINED, ts)
                    .context(EncodeElementSnafu { tag })?;
                for item in items {
                    encode_item_header(cursor, Length::UNDEFINED);
                    // an item may override the character set for its own scope
                    let item_charset = charset_of(item, charset);
                    write_elements(item, cursor, ts, options, item_charset)?;
                    encode_item_delimiter(cursor);
                }
                encode_sequence_delimiter(cursor);
            }
            DicomValue::PixelSequence { fragments: frames, .. } => {
                encode_header(cursor, tag, element.vr(), Length::UNDEFINED, ts)
                    .context(EncodeElementSnafu { tag })?;
                write_pixel_sequence(frames, cursor, options);
            }
        }
    }
    Ok(())
}

/// Write an encapsulated pixel data sequence:
/// a rebuilt Basic Offset Table referencing the first fragment
/// of each frame, followed by the fragments themselves.
fn write_pixel_sequence(frames: &[Vec<u8>], cursor: &mut WriteCursor, options: &EncodeOptions) {
    let mut fragments = Vec::new();
    let mut offsets = Vec::with_capacity(frames.len());
    let mut position = 0u32;
    for frame in frames {
        offsets.push(position);
        for fragment in fragment_frame(frame, options.pixel_fragment_size) {
            position += 8 + fragment.len() as u32;
            fragments.push(fragment);
        }
    }

    encode_item_header(cursor, Length(4 * offsets.len() as u32));
    for offset in offsets {
        cursor.write_u32(offset);
    }
    for fragment in fragments {
        encode_item_header(cursor, Length(fragment.len() as u32));
        cursor.write_bytes(&fragment);
    }
    encode_sequence_delimiter(cursor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::{DataElement, PrimitiveValue};
    use dcmio_encoding::Endianness;
    use smallvec::smallvec;

    fn write(dataset: &DataSet, ts: TransferSyntax) -> Vec<u8> {
        let mut cursor = WriteCursor::new(ts.endianness());
        write_data_set(dataset, &mut cursor, ts, &EncodeOptions::new()).unwrap();
        cursor.into_vec()
    }

    #[test]
    fn elements_written_in_tag_order() {
        let mut dataset = DataSet::new();
        dataset.put(DataElement::new(
            Tag(0x0028, 0x0010),
            VR::US,
            PrimitiveValue::from(512u16),
        ));
        dataset.put(DataElement::new(Tag(0x0008, 0x0060), VR::CS, "MR"));
        let bytes = write(&dataset, TransferSyntax::ExplicitVrLittleEndian);
        #[rustfmt::skip]
        let expected = [
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
            0x28, 0x00, 0x10, 0x00, b'U', b'S', 0x02, 0x00, 0x00, 0x02,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn sequences_use_undefined_length_framing() {
        let mut item = DataSet::new();
        item.put(DataElement::new(Tag(0x0008, 0x0060), VR::CS, "CT"));
        let mut dataset = DataSet::new();
        dataset.put(DataElement::new(
            Tag(0x0008, 0x1115),
            VR::SQ,
            DicomValue::new_sequence(vec![item]),
        ));
        let bytes = write(&dataset, TransferSyntax::ExplicitVrLittleEndian);
        #[rustfmt::skip]
        let expected = [
            0x08, 0x00, 0x15, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'C', b'T',
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn pixel_sequence_rebuilds_offset_table() {
        let mut dataset = DataSet::new();
        dataset.put(DataElement::new(
            Tag(0x7FE0, 0x0010),
            VR::OB,
            DicomValue::new_pixel_sequence(vec![vec![1, 2, 3, 4], vec![5, 6]]),
        ));
        let bytes = write(&dataset, TransferSyntax::ExplicitVrLittleEndian);
        #[rustfmt::skip]
        let expected = [
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // offset table: frame 2 starts 12 bytes past the table
            0xFE, 0xFF, 0x00, 0xE0, 0x08, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 1, 2, 3, 4,
            0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00, 5, 6,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn charset_declaration_drives_text_encoding() {
        let mut dataset = DataSet::new();
        dataset.put(DataElement::new(
            Tag::SPECIFIC_CHARACTER_SET,
            VR::CS,
            "ISO_IR 100",
        ));
        dataset.put(DataElement::new(
            Tag(0x0010, 0x0010),
            VR::PN,
            "Simões^João",
        ));
        let bytes = write(&dataset, TransferSyntax::ExplicitVrLittleEndian);
        // the name is written in 8859-1, not UTF-8
        let name_bytes = &bytes[bytes.len() - 12..];
        assert_eq!(name_bytes, b"Sim\xF5es^Jo\xE3o ");
    }

    #[test]
    fn implicit_vr_headers() {
        let mut dataset = DataSet::new();
        dataset.put(DataElement::new(
            Tag(0x0028, 0x0010),
            VR::US,
            PrimitiveValue::U16(smallvec![512]),
        ));
        let bytes = write(&dataset, TransferSyntax::ImplicitVrLittleEndian);
        assert_eq!(
            bytes,
            [0x28, 0x00, 0x10, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x02]
        );
    }

    #[test]
    fn big_endian_values() {
        let mut dataset = DataSet::new();
        dataset.put(DataElement::new(
            Tag(0x0028, 0x0010),
            VR::US,
            PrimitiveValue::U16(smallvec![512]),
        ));
        let bytes = write(&dataset, TransferSyntax::ExplicitVrBigEndian);
        assert_eq!(
            bytes,
            [0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x02, 0x00]
        );
    }
}
