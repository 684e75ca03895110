//! Reading whole data sets from in-memory buffers.
//!
//! The decoding loop consumes element headers and values in document
//! order, recursing into sequence items and reassembling encapsulated
//! pixel data. Nested content with a defined length is parsed through a
//! bounded sub-cursor, so a corrupt length can never escape its
//! enclosing scope.

use dcmio_core::{
    DataElement, DataSet, DicomValue, Length, PrimitiveValue, SequenceItemHeader,
    StandardDataDictionary, Tag, C, VR,
};
use dcmio_encoding::cursor::ReadCursor;
use dcmio_encoding::decode::{decode_header, decode_item_header};
use dcmio_encoding::text::{SpecificCharacterSet, TextCodec};
use dcmio_encoding::value_read::read_value;
use dcmio_encoding::TransferSyntax;
use snafu::{ensure, OptionExt, ResultExt};
use tracing::warn;

use crate::{
    DecodeElementSnafu, ReadError, SequenceDepthExceededSnafu, UndefinedFragmentLengthSnafu,
    UnexpectedDelimiterSnafu, UnsupportedCharacterSetSnafu,
};

/// The maximum admitted sequence nesting depth.
pub const MAX_SEQUENCE_DEPTH: u32 = 64;

type Result<T, E = ReadError> = std::result::Result<T, E>;

/// Options controlling data set decoding behavior.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodeOptions {
    /// On failure, log a warning and return the elements
    /// decoded so far instead of an error.
    pub ignore_errors: bool,
    /// Stop decoding once a top level element with this tag is found.
    pub stop_at_tag: Option<Tag>,
    /// Whether the stop element itself is decoded and kept.
    pub include_stop_tag_value: bool,
    /// Fail on an unrecognized Specific Character Set declaration
    /// instead of keeping the character set decoded so far.
    pub strict_charset: bool,
}

impl DecodeOptions {
    /// Create the default set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log failures and keep the partial data set instead of failing.
    pub fn ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }

    /// Stop before the value of the first top level element
    /// with the given tag.
    pub fn read_until(mut self, tag: Tag) -> Self {
        self.stop_at_tag = Some(tag);
        self.include_stop_tag_value = false;
        self
    }

    /// Stop after decoding the first top level element with the given tag.
    pub fn read_through(mut self, tag: Tag) -> Self {
        self.stop_at_tag = Some(tag);
        self.include_stop_tag_value = true;
        self
    }

    /// Fail on an unrecognized Specific Character Set declaration.
    pub fn strict_charset(mut self) -> Self {
        self.strict_charset = true;
        self
    }
}

/// How the element loop of one nesting level knows where to stop.
#[derive(Debug, Copy, Clone, PartialEq)]
enum Delimitation {
    /// Read until the end of the cursor's extent.
    EndOfData,
    /// Read until an item delimiter tag (undefined length items).
    ItemDelimiter,
}

/// Read a whole data set from the cursor under the given transfer syntax.
///
/// All remaining bytes of the cursor are consumed,
/// unless a stop tag is configured in the options.
/// All decoded text is held as UTF-8;
/// whenever a Specific Character Set (0008,0005) element is found,
/// subsequent text elements of its scope are decoded accordingly
/// and the element value itself is normalized to `ISO_IR 192`.
pub fn read_data_set(
    cursor: &mut ReadCursor,
    ts: TransferSyntax,
    options: &DecodeOptions,
) -> Result<DataSet> {
    let mut dataset = DataSet::new();
    let outcome = read_into(
        cursor,
        ts,
        options,
        SpecificCharacterSet::default(),
        0,
        Delimitation::EndOfData,
        &mut dataset,
    );
    match outcome {
        Ok(()) => Ok(dataset),
        Err(e) if options.ignore_errors => {
            warn!("data set decoding stopped early: {}", e);
            Ok(dataset)
        }
        Err(e) => Err(e),
    }
}

fn read_into(
    cursor: &mut ReadCursor,
    ts: TransferSyntax,
    options: &DecodeOptions,
    mut charset: SpecificCharacterSet,
    depth: u32,
    delimitation: Delimitation,
    dataset: &mut DataSet,
) -> Result<()> {
    loop {
        if delimitation == Delimitation::EndOfData && cursor.at_end() {
            return Ok(());
        }
        let header = decode_header(cursor, ts, &StandardDataDictionary)
            .context(DecodeElementSnafu)?;

        if header.tag.0 == 0xFFFE {
            if delimitation == Delimitation::ItemDelimiter && header.tag.is_item_delimiter() {
                return Ok(());
            }
            return UnexpectedDelimiterSnafu { tag: header.tag }.fail();
        }

        let stop_here = depth == 0 && options.stop_at_tag == Some(header.tag);
        if stop_here && !options.include_stop_tag_value {
            return Ok(());
        }

        let element = if header.vr == VR::SQ
            || (header.len.is_undefined() && !header.is_encapsulated_pixeldata())
        {
            let items = read_sequence_items(cursor, ts, options, charset, depth + 1, header.len)?;
            DataElement::new(header.tag, VR::SQ, DicomValue::new_sequence(items))
        } else if header.is_encapsulated_pixeldata() {
            let value = read_pixel_sequence(cursor, header.tag)?;
            DataElement::new(header.tag, header.vr, value)
        } else {
            // the length is necessarily defined at this point
            let len = header.len.0 as usize;
            let value = read_value(cursor, header.tag, header.vr, len, charset)
                .context(DecodeElementSnafu)?;
            let value = if header.tag == Tag::SPECIFIC_CHARACTER_SET {
                charset = resolve_charset(&value, charset, options)?;
                // text is re-encoded as UTF-8 from here on
                PrimitiveValue::Str(SpecificCharacterSet::IsoIr192.name().to_owned())
            } else {
                value
            };
            DataElement::new(header.tag, header.vr, DicomValue::Primitive(value))
        };
        dataset.put(element);

        if stop_here {
            return Ok(());
        }
    }
}

fn resolve_charset(
    value: &PrimitiveValue,
    current: SpecificCharacterSet,
    options: &DecodeOptions,
) -> Result<SpecificCharacterSet> {
    // multi-valued declarations drive ISO 2022 code extensions;
    // the first value names the base repertoire
    let name = value.string().unwrap_or("");
    match SpecificCharacterSet::from_code(name) {
        Some(charset) => Ok(charset),
        None if options.strict_charset => UnsupportedCharacterSetSnafu { name }.fail(),
        None => {
            warn!("unsupported character set `{}`, keeping {}", name, current.name());
            Ok(current)
        }
    }
}

fn read_sequence_items(
    cursor: &mut ReadCursor,
    ts: TransferSyntax,
    options: &DecodeOptions,
    charset: SpecificCharacterSet,
    depth: u32,
    len: Length,
) -> Result<Vec<DataSet>> {
    ensure!(
        depth <= MAX_SEQUENCE_DEPTH,
        SequenceDepthExceededSnafu {
            depth: MAX_SEQUENCE_DEPTH,
        }
    );
    let mut items = Vec::new();
    if let Some(total) = len.get() {
        let mut sub = cursor
            .sub_cursor(total as usize)
            .context(dcmio_encoding::error::OutOfRangeSnafu)
            .context(DecodeElementSnafu)?;
        while sub.has_more() {
            match decode_item_header(&mut sub).context(DecodeElementSnafu)? {
                SequenceItemHeader::Item { len } => {
                    items.push(read_item(&mut sub, ts, options, charset, depth, len)?);
                }
                SequenceItemHeader::SequenceDelimiter => break,
                SequenceItemHeader::ItemDelimiter => {
                    return UnexpectedDelimiterSnafu {
                        tag: Tag::ITEM_DELIMITER,
                    }
                    .fail()
                }
            }
        }
    } else {
        loop {
            match decode_item_header(cursor).context(DecodeElementSnafu)? {
                SequenceItemHeader::Item { len } => {
                    items.push(read_item(cursor, ts, options, charset, depth, len)?);
                }
                SequenceItemHeader::SequenceDelimiter => break,
                SequenceItemHeader::ItemDelimiter => {
                    return UnexpectedDelimiterSnafu {
                        tag: Tag::ITEM_DELIMITER,
                    }
                    .fail()
                }
            }
        }
    }
    Ok(items)
}

fn read_item(
    cursor: &mut ReadCursor,
    ts: TransferSyntax,
    options: &DecodeOptions,
    charset: SpecificCharacterSet,
    depth: u32,
    len: Length,
) -> Result<DataSet> {
    let mut item = DataSet::new();
    if let Some(total) = len.get() {
        let mut sub = cursor
            .sub_cursor(total as usize)
            .context(dcmio_encoding::error::OutOfRangeSnafu)
            .context(DecodeElementSnafu)?;
        read_into(
            &mut sub,
            ts,
            options,
            charset,
            depth,
            Delimitation::EndOfData,
            &mut item,
        )?;
    } else {
        read_into(
            cursor,
            ts,
            options,
            charset,
            depth,
            Delimitation::ItemDelimiter,
            &mut item,
        )?;
    }
    Ok(item)
}

/// Read an encapsulated pixel data sequence:
/// a Basic Offset Table item followed by compressed fragments,
/// terminated by a sequence delimiter.
/// Fragments are reassembled into one buffer per frame.
fn read_pixel_sequence(cursor: &mut ReadCursor, tag: Tag) -> Result<DicomValue> {
    let offset_table = match decode_item_header(cursor).context(DecodeElementSnafu)? {
        SequenceItemHeader::Item { len } => {
            let len = len.get().context(UndefinedFragmentLengthSnafu { tag })? as usize;
            let mut sub = cursor
                .sub_cursor(len)
                .context(dcmio_encoding::error::OutOfRangeSnafu)
                .context(DecodeElementSnafu)?;
            let mut offsets = C::with_capacity(len / 4);
            for _ in 0..len / 4 {
                offsets.push(
                    sub.read_u32()
                        .context(dcmio_encoding::error::OutOfRangeSnafu)
                        .context(DecodeElementSnafu)?,
                );
            }
            offsets
        }
        other => {
            return UnexpectedDelimiterSnafu { tag: other.tag() }.fail();
        }
    };

    // fragments paired with their byte offset past the offset table item,
    // as referenced by the offset table entries
    let mut fragments: Vec<(u32, Vec<u8>)> = Vec::new();
    let mut position = 0u32;
    loop {
        match decode_item_header(cursor).context(DecodeElementSnafu)? {
            SequenceItemHeader::Item { len } => {
                let len = len.get().context(UndefinedFragmentLengthSnafu { tag })?;
                let bytes = cursor
                    .read_vec(len as usize)
                    .context(dcmio_encoding::error::OutOfRangeSnafu)
                    .context(DecodeElementSnafu)?;
                fragments.push((position, bytes));
                position += 8 + len;
            }
            SequenceItemHeader::SequenceDelimiter => break,
            SequenceItemHeader::ItemDelimiter => {
                return UnexpectedDelimiterSnafu {
                    tag: Tag::ITEM_DELIMITER,
                }
                .fail()
            }
        }
    }

    let frames = if offset_table.is_empty() {
        // without an offset table, all fragments belong to a single frame
        if fragments.is_empty() {
            Vec::new()
        } else {
            let mut frame = Vec::new();
            for (_, bytes) in fragments {
                frame.extend_from_slice(&bytes);
            }
            vec![frame]
        }
    } else {
        let mut frames = vec![Vec::new(); offset_table.len()];
        let mut frame = 0;
        for (offset, bytes) in fragments {
            while frame + 1 < offset_table.len() && offset >= offset_table[frame + 1] {
                frame += 1;
            }
            frames[frame].extend_from_slice(&bytes);
        }
        frames
    };

    Ok(DicomValue::PixelSequence {
        offset_table,
        fragments: frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_encoding::Endianness;

    #[test]
    fn read_simple_explicit_le() {
        #[rustfmt::skip]
        let data = [
            // (0008,0060) CS, 2 bytes, "MR"
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
            // (0028,0010) US, 2 bytes, 512
            0x28, 0x00, 0x10, 0x00, b'U', b'S', 0x02, 0x00, 0x00, 0x02,
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.string_value(Tag(0x0008, 0x0060)), Some("MR"));
        let rows = dataset.element(Tag(0x0028, 0x0010)).unwrap();
        assert_eq!(rows.vr(), VR::US);
        assert_eq!(rows.value().primitive().unwrap().uint16().unwrap(), 512);
    }

    #[test]
    fn stop_at_tag() {
        #[rustfmt::skip]
        let data = [
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
            0x28, 0x00, 0x10, 0x00, b'U', b'S', 0x02, 0x00, 0x00, 0x02,
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let options = DecodeOptions::new().read_until(Tag(0x0028, 0x0010));
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &options,
        )
        .unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(!dataset.contains(Tag(0x0028, 0x0010)));

        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let options = DecodeOptions::new().read_through(Tag(0x0028, 0x0010));
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &options,
        )
        .unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.contains(Tag(0x0028, 0x0010)));
    }

    #[test]
    fn truncated_input_keeps_partial_when_lenient() {
        #[rustfmt::skip]
        let data = [
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
            // header declares 4 bytes but only 2 remain
            0x28, 0x00, 0x10, 0x00, b'U', b'L', 0x04, 0x00, 0x00, 0x02,
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let err = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ReadError::DecodeElement { .. }));

        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new().ignore_errors(),
        )
        .unwrap();
        // the partial element is not kept
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.string_value(Tag(0x0008, 0x0060)), Some("MR"));
    }

    #[test]
    fn charset_switch_normalizes_declaration() {
        #[rustfmt::skip]
        let data = [
            // (0008,0005) CS, 10 bytes, "ISO_IR 100"
            0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00,
            b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'0', b'0',
            // (0010,0010) PN, 12 bytes, "Simões^João" in 8859-1
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x0C, 0x00,
            b'S', b'i', b'm', 0xF5, b'e', b's', b'^', b'J', b'o', 0xE3, b'o', b' ',
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap();
        assert_eq!(
            dataset.string_value(Tag(0x0010, 0x0010)),
            Some("Simões^João")
        );
        // the declaration is rewritten to match the in-memory encoding
        assert_eq!(
            dataset.string_value(Tag(0x0008, 0x0005)),
            Some("ISO_IR 192")
        );
    }

    #[test]
    fn unknown_charset_strict_vs_lenient() {
        #[rustfmt::skip]
        let data = [
            0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00,
            b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'9', b'9', b' ',
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let err = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new().strict_charset(),
        )
        .unwrap_err();
        assert!(matches!(err, ReadError::UnsupportedCharacterSet { .. }));

        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn sequence_with_defined_and_undefined_items() {
        #[rustfmt::skip]
        let data = [
            // (0008,1115) SQ, undefined length
            0x08, 0x00, 0x15, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // item, defined length 10
            0xFE, 0xFF, 0x00, 0xE0, 0x0A, 0x00, 0x00, 0x00,
            // (0008,0060) CS "CT"
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'C', b'T',
            // item, undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // (0008,0060) CS "MR"
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
            // item delimiter
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // sequence delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap();
        let seq = dataset.element(Tag(0x0008, 0x1115)).unwrap();
        let items = seq.value().items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].string_value(Tag(0x0008, 0x0060)), Some("CT"));
        assert_eq!(items[1].string_value(Tag(0x0008, 0x0060)), Some("MR"));
    }

    #[test]
    fn implicit_undefined_length_reads_as_sequence() {
        #[rustfmt::skip]
        let data = [
            // (0009,1010) unlisted private tag, undefined length
            0x09, 0x00, 0x10, 0x10, 0xFF, 0xFF, 0xFF, 0xFF,
            // item, undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // item delimiter
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // sequence delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ImplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap();
        let element = dataset.element(Tag(0x0009, 0x1010)).unwrap();
        assert_eq!(element.vr(), VR::SQ);
        assert_eq!(element.value().items().unwrap().len(), 1);
    }

    #[test]
    fn encapsulated_pixel_data_frames() {
        #[rustfmt::skip]
        let data = [
            // (7FE0,0010) OB, undefined length
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // basic offset table: two frames at 0 and 12
            0xFE, 0xFF, 0x00, 0xE0, 0x08, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00,
            // fragment 1 (frame 1), 4 bytes
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 1, 2, 3, 4,
            // fragment 2 (frame 2), 2 bytes
            0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00, 5, 6,
            // sequence delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap();
        let pixel = dataset.element(Tag(0x7FE0, 0x0010)).unwrap();
        let frames = pixel.value().fragments().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], vec![1, 2, 3, 4]);
        assert_eq!(frames[1], vec![5, 6]);
    }

    #[test]
    fn encapsulated_empty_offset_table_is_one_frame() {
        #[rustfmt::skip]
        let data = [
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // empty basic offset table
            0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // two fragments
            0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00, 1, 2,
            0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00, 3, 4,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let dataset = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap();
        let frames = dataset
            .element(Tag(0x7FE0, 0x0010))
            .unwrap()
            .value()
            .fragments()
            .unwrap();
        assert_eq!(frames, &[vec![1, 2, 3, 4]]);
    }

    #[test]
    fn runaway_nesting_is_bounded() {
        // sequences nested beyond the admitted depth,
        // each as an undefined length sequence holding one undefined item
        let mut data = Vec::new();
        for _ in 0..MAX_SEQUENCE_DEPTH + 1 {
            data.extend_from_slice(&[
                0x08, 0x00, 0x15, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            ]);
            data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
        }
        let mut cursor = ReadCursor::new(&data, Endianness::Little);
        let err = read_data_set(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &DecodeOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ReadError::SequenceDepthExceeded { .. }));
    }
}
