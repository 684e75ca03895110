//! Encoding of primitive element values into their wire form.

use byteordered::Endianness;
use dcmio_core::{PrimitiveValue, C, VR};
use snafu::ResultExt;
use tracing::warn;

use crate::cursor::WriteCursor;
use crate::error::{EncodeTextSnafu, MismatchedValueSnafu, Result, ValueTooLongSnafu};
use crate::text::{DefaultCharacterSetCodec, SpecificCharacterSet, TextCodec};

/// Options controlling data set encoding behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    /// Accept value components longer than their VR's maximum length,
    /// writing them unchanged.
    pub allow_invalid_length: bool,
    /// Truncate oversized text components to their VR's maximum length
    /// instead of failing. Has no effect when `allow_invalid_length`
    /// is set. Enabled by default.
    pub truncate_oversize_text: bool,
    /// Split each pixel data frame into encapsulated fragments
    /// of at most this many bytes.
    /// When unset, each frame becomes a single fragment.
    pub pixel_fragment_size: Option<usize>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            allow_invalid_length: false,
            truncate_oversize_text: true,
            pixel_fragment_size: None,
        }
    }
}

impl EncodeOptions {
    /// Create the default set of options.
    pub fn new() -> Self {
        Self::default()
    }
}

macro_rules! write_multi {
    ($value: expr, $vr: expr, $endianness: expr, $width: literal, $write: ident, $variant: ident) => {
        match $value {
            PrimitiveValue::$variant(values) => {
                let mut cursor = WriteCursor::with_capacity(values.len() * $width, $endianness);
                for v in values {
                    cursor.$write(*v);
                }
                Ok(cursor.into_vec())
            }
            PrimitiveValue::Empty => Ok(Vec::new()),
            other => MismatchedValueSnafu {
                vr: $vr,
                kind: other.kind(),
            }
            .fail(),
        }
    };
}

/// Encode a primitive value into the bytes of its wire form,
/// padded to an even length with the VR's padding byte.
///
/// Binary values follow the given byte order.
/// Multi-valued strings are joined with backslashes,
/// and numbers held under a string representation (DS, IS)
/// are formatted back into decimal text.
pub fn encode_value(
    vr: VR,
    value: &PrimitiveValue,
    endianness: Endianness,
    charset: SpecificCharacterSet,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    let mut bytes = match vr {
        VR::AT => encode_tags(value, vr, endianness),
        VR::FL => write_multi!(value, vr, endianness, 4, write_f32, F32),
        VR::FD => write_multi!(value, vr, endianness, 8, write_f64, F64),
        VR::SL => write_multi!(value, vr, endianness, 4, write_i32, I32),
        VR::SS => write_multi!(value, vr, endianness, 2, write_i16, I16),
        VR::UL => write_multi!(value, vr, endianness, 4, write_u32, U32),
        VR::US => write_multi!(value, vr, endianness, 2, write_u16, U16),
        vr if vr.is_string() => encode_text(vr, value, charset, options),
        // OB, OW, OF, UN and anything else: raw bytes
        _ => match value {
            PrimitiveValue::U8(bytes) => Ok(bytes.to_vec()),
            PrimitiveValue::Empty => Ok(Vec::new()),
            other => MismatchedValueSnafu {
                vr,
                kind: other.kind(),
            }
            .fail(),
        },
    }?;
    if bytes.len() % 2 != 0 {
        bytes.push(vr.padding());
    }
    Ok(bytes)
}

fn encode_tags(value: &PrimitiveValue, vr: VR, endianness: Endianness) -> Result<Vec<u8>> {
    match value {
        PrimitiveValue::Tags(tags) => {
            let mut cursor = WriteCursor::with_capacity(tags.len() * 4, endianness);
            for tag in tags {
                cursor.write_u16(tag.0);
                cursor.write_u16(tag.1);
            }
            Ok(cursor.into_vec())
        }
        PrimitiveValue::Empty => Ok(Vec::new()),
        other => MismatchedValueSnafu {
            vr,
            kind: other.kind(),
        }
        .fail(),
    }
}

fn encode_text(
    vr: VR,
    value: &PrimitiveValue,
    charset: SpecificCharacterSet,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    let components = text_components(vr, value)?;
    let mut checked = Vec::with_capacity(components.len());
    for component in components {
        checked.push(enforce_max_length(vr, component, options)?);
    }
    let text = checked.join("\\");
    if vr.is_encoded_string() {
        charset.encode(&text).context(EncodeTextSnafu)
    } else {
        DefaultCharacterSetCodec.encode(&text).context(EncodeTextSnafu)
    }
}

fn text_components(vr: VR, value: &PrimitiveValue) -> Result<Vec<String>> {
    match value {
        PrimitiveValue::Empty => Ok(Vec::new()),
        PrimitiveValue::Str(s) => Ok(vec![s.clone()]),
        PrimitiveValue::Strs(c) => Ok(c.to_vec()),
        PrimitiveValue::F64(c) if vr == VR::DS => {
            Ok(c.iter().map(|v| format_decimal(*v)).collect())
        }
        PrimitiveValue::F32(c) if vr == VR::DS => {
            Ok(c.iter().map(|v| format_decimal(f64::from(*v))).collect())
        }
        PrimitiveValue::I32(c) if vr == VR::IS => Ok(c.iter().map(i32::to_string).collect()),
        other => MismatchedValueSnafu {
            vr,
            kind: other.kind(),
        }
        .fail(),
    }
}

/// Format a number into decimal string form,
/// switching to exponent notation with reduced precision
/// when the plain form exceeds the 16 bytes admitted by DS.
fn format_decimal(value: f64) -> String {
    let plain = value.to_string();
    if plain.len() <= 16 {
        return plain;
    }
    let mut precision = 10;
    loop {
        let formatted = format!("{:.*e}", precision, value);
        if formatted.len() <= 16 || precision == 0 {
            return formatted;
        }
        precision -= 1;
    }
}

fn enforce_max_length(vr: VR, component: String, options: &EncodeOptions) -> Result<String> {
    let max = match vr.max_length() {
        Some(max) => max as usize,
        None => return Ok(component),
    };
    if component.len() <= max || options.allow_invalid_length {
        return Ok(component);
    }
    if vr.is_string() && options.truncate_oversize_text {
        warn!(
            "truncating {} byte {} component to the maximum of {}",
            component.len(),
            vr,
            max
        );
        // cut on a character boundary at or below the limit
        let mut end = max;
        while !component.is_char_boundary(end) {
            end -= 1;
        }
        let mut component = component;
        component.truncate(end);
        return Ok(component);
    }
    ValueTooLongSnafu {
        vr,
        length: component.len(),
        max: max as u32,
    }
    .fail()
}

/// Split a frame buffer into fragments of at most `fragment_size` bytes,
/// each one padded to an even length.
pub fn fragment_frame(frame: &[u8], fragment_size: Option<usize>) -> Vec<C<u8>> {
    let size = match fragment_size {
        // fragment boundaries must be even
        Some(size) if size >= 2 => size & !1,
        _ => frame.len().max(2),
    };
    let mut fragments: Vec<C<u8>> = frame
        .chunks(size)
        .map(C::from_slice)
        .collect();
    if fragments.is_empty() {
        fragments.push(C::new());
    }
    for fragment in &mut fragments {
        if fragment.len() % 2 != 0 {
            fragment.push(0x00);
        }
    }
    fragments
}
