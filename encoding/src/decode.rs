//! Decoding of data element and sequence item headers.
//!
//! Element headers take one of three shapes on the wire:
//! implicit VR (tag + 4-byte length), short form explicit VR
//! (tag + 2-byte VR code + 2-byte length), and long form explicit VR
//! (tag + 2-byte VR code + 2 reserved bytes + 4-byte length).
//! Item and delimiter tags of group FFFE never carry a VR field,
//! regardless of transfer syntax.

use dcmio_core::dictionary::DataDictionary;
use dcmio_core::{DataElementHeader, Length, SequenceItemHeader, Tag, VR};
use snafu::ResultExt;
use tracing::warn;

use crate::cursor::ReadCursor;
use crate::error::{BadSequenceHeaderSnafu, OutOfRangeSnafu, Result};
use crate::transfer_syntax::TransferSyntax;

/// Decode an attribute tag: a group number
/// followed by an element number, in the cursor's byte order.
pub fn decode_tag(cursor: &mut ReadCursor) -> Result<Tag> {
    let group = cursor.read_u16().context(OutOfRangeSnafu)?;
    let element = cursor.read_u16().context(OutOfRangeSnafu)?;
    Ok(Tag(group, element))
}

/// Decode a full data element header under the given transfer syntax,
/// leaving the cursor at the first byte of the element's value.
///
/// Under an implicit VR syntax, the value representation is resolved
/// through the data dictionary,
/// falling back to contextual guesses for unlisted tags.
/// Under an explicit VR syntax, a VR code that matches no known
/// representation is decoded as [`VR::UN`].
pub fn decode_header<D>(
    cursor: &mut ReadCursor,
    ts: TransferSyntax,
    dict: &D,
) -> Result<DataElementHeader>
where
    D: DataDictionary,
{
    let tag = decode_tag(cursor)?;

    if !ts.explicit_vr() {
        let len = Length(cursor.read_u32().context(OutOfRangeSnafu)?);
        let vr = implicit_vr_of(tag, len, dict);
        return Ok(DataElementHeader::new(tag, vr, len));
    }

    // item and delimiter tags carry no VR field in any transfer syntax
    if tag.0 == 0xFFFE {
        let len = Length(cursor.read_u32().context(OutOfRangeSnafu)?);
        return Ok(DataElementHeader::new(tag, VR::UN, len));
    }

    let code = cursor.take(2).context(OutOfRangeSnafu)?;
    let vr = VR::from_binary([code[0], code[1]]).unwrap_or_else(|| {
        warn!(
            "unrecognized VR code {:#04X} {:#04X} in {}, reading as UN",
            code[0], code[1], tag
        );
        VR::UN
    });

    let len = if vr.is_explicit_long() {
        // two reserved bytes, then a 4-byte length
        cursor.skip(2).context(OutOfRangeSnafu)?;
        Length(cursor.read_u32().context(OutOfRangeSnafu)?)
    } else {
        Length(u32::from(cursor.read_u16().context(OutOfRangeSnafu)?))
    };

    Ok(DataElementHeader::new(tag, vr, len))
}

/// Decode an item, item delimiter, or sequence delimiter header.
pub fn decode_item_header(cursor: &mut ReadCursor) -> Result<SequenceItemHeader> {
    let tag = decode_tag(cursor)?;
    let len = Length(cursor.read_u32().context(OutOfRangeSnafu)?);
    SequenceItemHeader::new(tag, len).context(BadSequenceHeaderSnafu)
}

/// Resolve the value representation of an element
/// read under an implicit VR transfer syntax.
fn implicit_vr_of<D>(tag: Tag, len: Length, dict: &D) -> VR
where
    D: DataDictionary,
{
    if tag.0 == 0xFFFE {
        return VR::UN;
    }
    if let Some(entry) = dict.by_tag(tag) {
        return entry.vr;
    }
    if len.is_undefined() {
        // an unlisted element of undefined length can only be a sequence
        VR::SQ
    } else if tag.is_pixel_data() || (tag.0 >> 8 == 0x60 && tag.1 == 0x3000) {
        VR::OW
    } else if tag.is_private_creator() {
        VR::LO
    } else {
        VR::UN
    }
}
