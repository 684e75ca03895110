//! DICOM attribute tag type and tag-level predicates.

use snafu::{ensure, Backtrace, ResultExt, Snafu};
use std::fmt;
use std::str::FromStr;

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// Error type for failures in parsing a tag from its text form.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ParseTagError {
    /// The text does not have the expected number of characters.
    /// Accepted forms are `GGGGEEEE` and `(GGGG,EEEE)`.
    #[snafu(display("Unexpected tag text length {}", len))]
    UnexpectedLength { len: usize, backtrace: Backtrace },
    /// One of the two tag parts is not valid hexadecimal.
    #[snafu(display("Invalid hexadecimal in tag part `{}`", part))]
    InvalidHex {
        part: String,
        source: std::num::ParseIntError,
        backtrace: Backtrace,
    },
    /// The parenthesized form is malformed
    /// (missing parenthesis or comma separator).
    #[snafu(display("Malformed parenthesized tag `{}`", text))]
    MalformedParens { text: String, backtrace: Backtrace },
    /// The text contains characters outside the ASCII range.
    #[snafu(display("Tag text is not ASCII"))]
    NotAscii { backtrace: Backtrace },
}

/// The data type for DICOM data element tags.
///
/// The tag is a `(group, element)` pair of 16-bit numbers,
/// ordered first by group and then by element.
/// Both `(u16, u16)` and `[u16; 2]` can be efficiently converted
/// to this type, as well as the packed `u32` form
/// with the group in the upper 16 bits.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// Item header tag.
    pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
    /// Item delimitation tag, closing an undefined-length item.
    pub const ITEM_DELIMITER: Tag = Tag(0xFFFE, 0xE00D);
    /// Sequence delimitation tag, closing an undefined-length sequence.
    pub const SEQUENCE_DELIMITER: Tag = Tag(0xFFFE, 0xE0DD);
    /// Pixel Data attribute tag.
    pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
    /// Specific Character Set attribute tag.
    pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
    /// File Meta Information Group Length attribute tag.
    pub const FILE_META_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
    /// Transfer Syntax UID attribute tag.
    pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);

    /// Getter for the tag's group value.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// Getter for the tag's element value.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Check whether this tag is the Pixel Data attribute tag.
    #[inline]
    pub fn is_pixel_data(self) -> bool {
        self == Tag::PIXEL_DATA
    }

    /// Check whether this tag reserves a private block:
    /// an odd group with an element between 0x0001 and 0x00FF.
    #[inline]
    pub fn is_private_creator(self) -> bool {
        self.0 % 2 == 1 && self.1 > 0 && self.1 < 0x100
    }

    /// Check whether this is an item header tag.
    #[inline]
    pub fn is_item(self) -> bool {
        self == Tag::ITEM
    }

    /// Check whether this is an item delimitation tag.
    #[inline]
    pub fn is_item_delimiter(self) -> bool {
        self == Tag::ITEM_DELIMITER
    }

    /// Check whether this is a sequence delimitation tag.
    #[inline]
    pub fn is_sequence_delimiter(self) -> bool {
        self == Tag::SEQUENCE_DELIMITER
    }

    /// Check whether this is a group length tag (element 0x0000).
    #[inline]
    pub fn is_group_length(self) -> bool {
        self.1 == 0
    }

    /// Render the tag in plain `GGGGEEEE` form,
    /// zero-padded and in upper case.
    pub fn to_hex(self) -> String {
        format!("{:04X}{:04X}", self.0, self.1)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X?}, {:#06X?})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl PartialEq<(u16, u16)> for Tag {
    fn eq(&self, other: &(u16, u16)) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl PartialEq<[u16; 2]> for Tag {
    fn eq(&self, other: &[u16; 2]) -> bool {
        self.0 == other[0] && self.1 == other[1]
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

impl From<[u16; 2]> for Tag {
    #[inline]
    fn from(value: [u16; 2]) -> Tag {
        Tag(value[0], value[1])
    }
}

impl From<u32> for Tag {
    #[inline]
    fn from(value: u32) -> Tag {
        Tag((value >> 16) as u16, (value & 0xFFFF) as u16)
    }
}

impl From<Tag> for u32 {
    #[inline]
    fn from(tag: Tag) -> u32 {
        (u32::from(tag.0) << 16) | u32::from(tag.1)
    }
}

fn parse_part(part: &str) -> Result<u16, ParseTagError> {
    u16::from_str_radix(part, 16).context(InvalidHexSnafu { part })
}

/// Parse a tag from either the plain `GGGGEEEE` form
/// or the parenthesized `(GGGG,EEEE)` form,
/// in upper or lower case.
impl FromStr for Tag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // byte-index slicing below requires single-byte characters
        ensure!(s.is_ascii(), NotAsciiSnafu);
        match s.len() {
            8 => {
                let group = parse_part(&s[0..4])?;
                let element = parse_part(&s[4..8])?;
                Ok(Tag(group, element))
            }
            11 => {
                ensure!(
                    s.starts_with('(') && s.ends_with(')') && &s[5..6] == ",",
                    MalformedParensSnafu { text: s }
                );
                let group = parse_part(&s[1..5])?;
                let element = parse_part(&s[6..10])?;
                Ok(Tag(group, element))
            }
            len => UnexpectedLengthSnafu { len }.fail(),
        }
    }
}
