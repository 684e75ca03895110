//! Encoding of data element and sequence item headers.

use dcmio_core::{Length, Tag, VR};
use snafu::ensure;

use crate::cursor::WriteCursor;
use crate::error::{HeaderOverflowSnafu, Result};
use crate::transfer_syntax::TransferSyntax;

/// Encode an attribute tag in the cursor's byte order.
pub fn encode_tag(cursor: &mut WriteCursor, tag: Tag) {
    cursor.write_u16(tag.0);
    cursor.write_u16(tag.1);
}

/// Encode a data element header under the given transfer syntax.
///
/// Fails if the length does not fit the 16-bit field
/// of a short form explicit VR header.
pub fn encode_header(
    cursor: &mut WriteCursor,
    tag: Tag,
    vr: VR,
    len: Length,
    ts: TransferSyntax,
) -> Result<()> {
    encode_tag(cursor, tag);

    // implicit headers and item framing tags have no VR field
    if !ts.explicit_vr() || tag.0 == 0xFFFE {
        cursor.write_u32(len.0);
        return Ok(());
    }

    cursor.write_bytes(&vr.to_bytes());
    if vr.is_explicit_long() {
        cursor.write_u16(0); // reserved
        cursor.write_u32(len.0);
    } else {
        ensure!(
            len.0 <= u32::from(u16::MAX),
            HeaderOverflowSnafu {
                tag,
                vr,
                length: u64::from(len.0),
            }
        );
        cursor.write_u16(len.0 as u16);
    }
    Ok(())
}

/// Encode an item header with the given content length.
pub fn encode_item_header(cursor: &mut WriteCursor, len: Length) {
    encode_tag(cursor, Tag::ITEM);
    cursor.write_u32(len.0);
}

/// Encode an item delimiter (always zero length).
pub fn encode_item_delimiter(cursor: &mut WriteCursor) {
    encode_tag(cursor, Tag::ITEM_DELIMITER);
    cursor.write_u32(0);
}

/// Encode a sequence delimiter (always zero length).
pub fn encode_sequence_delimiter(cursor: &mut WriteCursor) {
    encode_tag(cursor, Tag::SEQUENCE_DELIMITER);
    cursor.write_u32(0);
}
