//! Decoding of primitive element values into their in-memory form.

use dcmio_core::{PrimitiveValue, Tag, C, VR};
use snafu::ResultExt;

use crate::cursor::ReadCursor;
use crate::error::{DecodeTextSnafu, OutOfRangeSnafu, Result};
use crate::text::{DefaultCharacterSetCodec, SpecificCharacterSet, TextCodec};

macro_rules! read_multi {
    ($cursor: expr, $len: expr, $width: literal, $read: ident, $variant: ident) => {{
        let count = $len / $width;
        let mut values = C::with_capacity(count);
        for _ in 0..count {
            values.push($cursor.$read().context(OutOfRangeSnafu)?);
        }
        // ignore any trailing bytes short of a full scalar
        $cursor.skip($len % $width).context(OutOfRangeSnafu)?;
        Ok(PrimitiveValue::$variant(values))
    }};
}

/// Decode `len` bytes of value content at the cursor's position
/// into the in-memory form dictated by the value representation.
///
/// Binary values follow the cursor's byte order.
/// String values are decoded into UTF-8:
/// backslash-splitting representations through the default repertoire,
/// the remaining text representations through the given character set.
/// Trailing padding is stripped from strings,
/// and decimal and integer strings are parsed into numbers;
/// when any component is empty or fails to parse,
/// the whole value keeps its text form so that nothing is lost.
pub fn read_value(
    cursor: &mut ReadCursor,
    tag: Tag,
    vr: VR,
    len: usize,
    charset: SpecificCharacterSet,
) -> Result<PrimitiveValue> {
    if len == 0 {
        return Ok(PrimitiveValue::Empty);
    }
    match vr {
        VR::AT => read_tags(cursor, len),
        VR::FL => read_multi!(cursor, len, 4, read_f32, F32),
        VR::FD => read_multi!(cursor, len, 8, read_f64, F64),
        VR::SL => read_multi!(cursor, len, 4, read_i32, I32),
        VR::SS => read_multi!(cursor, len, 2, read_i16, I16),
        VR::UL => read_multi!(cursor, len, 4, read_u32, U32),
        VR::US => read_multi!(cursor, len, 2, read_u16, U16),
        VR::DS => {
            let value = read_split_strings(cursor, tag, len)?;
            Ok(parse_components(value, str::parse::<f64>, PrimitiveValue::F64))
        }
        VR::IS => {
            let value = read_split_strings(cursor, tag, len)?;
            Ok(parse_components(value, str::parse::<i32>, PrimitiveValue::I32))
        }
        vr if vr.splits_on_backslash() => read_split_strings(cursor, tag, len),
        vr if vr.is_encoded_string() => {
            let bytes = cursor.take(len).context(OutOfRangeSnafu)?;
            let text = charset.decode(bytes).context(DecodeTextSnafu { tag })?;
            Ok(PrimitiveValue::Str(trim_padding(&text).to_owned()))
        }
        // OB, OW, OF, UN and anything else: raw bytes
        _ => {
            let bytes = cursor.take(len).context(OutOfRangeSnafu)?;
            Ok(PrimitiveValue::U8(C::from_slice(bytes)))
        }
    }
}

fn read_tags(cursor: &mut ReadCursor, len: usize) -> Result<PrimitiveValue> {
    let count = len / 4;
    let mut tags = C::with_capacity(count);
    for _ in 0..count {
        let group = cursor.read_u16().context(OutOfRangeSnafu)?;
        let element = cursor.read_u16().context(OutOfRangeSnafu)?;
        tags.push(Tag(group, element));
    }
    cursor.skip(len % 4).context(OutOfRangeSnafu)?;
    Ok(PrimitiveValue::Tags(tags))
}

fn read_split_strings(cursor: &mut ReadCursor, tag: Tag, len: usize) -> Result<PrimitiveValue> {
    let bytes = cursor.take(len).context(OutOfRangeSnafu)?;
    let text = DefaultCharacterSetCodec
        .decode(bytes)
        .context(DecodeTextSnafu { tag })?;
    let text = trim_padding(&text);
    let mut parts = text.split('\\').map(str::to_owned);
    match (parts.next(), parts.next()) {
        (Some(single), None) => Ok(PrimitiveValue::Str(single)),
        (Some(first), Some(second)) => {
            let mut values: C<String> = C::new();
            values.push(first);
            values.push(second);
            values.extend(parts);
            Ok(PrimitiveValue::Strs(values))
        }
        (None, _) => Ok(PrimitiveValue::Empty),
    }
}

fn trim_padding(text: &str) -> &str {
    text.trim_end_matches(|c| c == ' ' || c == '\0')
}

/// Parse each string component into a number,
/// falling back to the original text value
/// if any component does not parse cleanly.
fn parse_components<T, E>(
    value: PrimitiveValue,
    parse: impl Fn(&str) -> Result<T, E>,
    wrap: impl Fn(C<T>) -> PrimitiveValue,
) -> PrimitiveValue {
    let components = match &value {
        PrimitiveValue::Str(s) => std::slice::from_ref(s),
        PrimitiveValue::Strs(c) => c.as_slice(),
        _ => return value,
    };
    let parsed: Option<C<T>> = components
        .iter()
        .map(|s| parse(s.trim()).ok())
        .collect();
    match parsed {
        Some(numbers) => wrap(numbers),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteordered::Endianness;
    use smallvec::smallvec;

    const TAG: Tag = Tag(0x0009, 0x0001);

    fn read(data: &[u8], vr: VR, endianness: Endianness) -> PrimitiveValue {
        let mut cursor = ReadCursor::new(data, endianness);
        read_value(&mut cursor, TAG, vr, data.len(), SpecificCharacterSet::Default).unwrap()
    }

    #[test]
    fn binary_values() {
        assert_eq!(
            read(&[0x00, 0x01, 0x10, 0x00], VR::US, Endianness::Little),
            PrimitiveValue::U16(smallvec![256, 16])
        );
        assert_eq!(
            read(&[0x00, 0x01, 0x00, 0x10], VR::US, Endianness::Big),
            PrimitiveValue::U16(smallvec![1, 16])
        );
        assert_eq!(
            read(&[0x00, 0x00, 0x80, 0x3F], VR::FL, Endianness::Little),
            PrimitiveValue::F32(smallvec![1.0])
        );
        assert_eq!(
            read(&[0xFE, 0xFF], VR::SS, Endianness::Little),
            PrimitiveValue::I16(smallvec![-2])
        );
    }

    #[test]
    fn attribute_tags() {
        assert_eq!(
            read(
                &[0x08, 0x00, 0x60, 0x00, 0x10, 0x00, 0x10, 0x00],
                VR::AT,
                Endianness::Little
            ),
            PrimitiveValue::Tags(smallvec![Tag(0x0008, 0x0060), Tag(0x0010, 0x0010)])
        );
    }

    #[test]
    fn split_strings() {
        assert_eq!(
            read(b"DERIVED\\PRIMARY ", VR::CS, Endianness::Little),
            PrimitiveValue::Strs(smallvec!["DERIVED".into(), "PRIMARY".into()])
        );
        assert_eq!(
            read(b"MR", VR::CS, Endianness::Little),
            PrimitiveValue::Str("MR".into())
        );
        // trailing NUL padding of UI values is stripped
        assert_eq!(
            read(b"1.2.840.10008.1.2.1\0", VR::UI, Endianness::Little),
            PrimitiveValue::Str("1.2.840.10008.1.2.1".into())
        );
    }

    #[test]
    fn numeric_strings() {
        assert_eq!(
            read(b"1.5\\-0.5", VR::DS, Endianness::Little),
            PrimitiveValue::F64(smallvec![1.5, -0.5])
        );
        assert_eq!(
            read(b" 42 ", VR::IS, Endianness::Little),
            PrimitiveValue::I32(smallvec![42])
        );
        // a single bad component keeps the whole value textual
        assert_eq!(
            read(b"1.5\\x2", VR::DS, Endianness::Little),
            PrimitiveValue::Strs(smallvec!["1.5".into(), "x2".into()])
        );
    }

    #[test]
    fn encoded_text_never_splits() {
        // a backslash in a UT value is content, not a value delimiter
        assert_eq!(
            read(b"C:\\data\\scan ", VR::UT, Endianness::Little),
            PrimitiveValue::Str("C:\\data\\scan".into())
        );
        assert_eq!(
            read(b"line\\break", VR::LT, Endianness::Little),
            PrimitiveValue::Str("line\\break".into())
        );
    }

    #[test]
    fn encoded_text() {
        let mut cursor = ReadCursor::new(b"Sim\xF5es^Jo\xE3o ", Endianness::Little);
        let value = read_value(
            &mut cursor,
            TAG,
            VR::PN,
            12,
            SpecificCharacterSet::IsoIr100,
        )
        .unwrap();
        assert_eq!(value, PrimitiveValue::Str("Simões^João".into()));
    }

    #[test]
    fn raw_bytes() {
        assert_eq!(
            read(&[1, 2, 3, 4], VR::OB, Endianness::Little),
            PrimitiveValue::U8(smallvec![1, 2, 3, 4])
        );
    }

    #[test]
    fn empty_value() {
        assert_eq!(read(&[], VR::PN, Endianness::Little), PrimitiveValue::Empty);
    }

    #[test]
    fn truncated_value_is_out_of_range() {
        let mut cursor = ReadCursor::new(&[0x00, 0x01], Endianness::Little);
        assert!(read_value(&mut cursor, TAG, VR::UL, 4, SpecificCharacterSet::Default).is_err());
    }
}
