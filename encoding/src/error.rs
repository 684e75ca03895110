//! Error types for encoding and decoding data element content.

use dcmio_core::header::SequenceItemHeaderError;
use dcmio_core::{Tag, VR};
use snafu::{Backtrace, Snafu};

use crate::cursor::OutOfRange;
use crate::text::{DecodeTextError, EncodeTextError};

/// The main error type for element encoding and decoding operations.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub))]
pub enum Error {
    /// Access past the bounds of the underlying cursor.
    #[snafu(display("{}", source))]
    OutOfRange {
        /// The underlying cursor error.
        #[snafu(backtrace)]
        source: OutOfRange,
    },
    /// A tag read where item framing was expected
    /// is not an item or delimiter tag,
    /// or a delimiter declares a non-zero length.
    #[snafu(display("Bad sequence item header: {}", source))]
    BadSequenceHeader {
        /// The underlying item header error.
        #[snafu(backtrace)]
        source: SequenceItemHeaderError,
    },
    /// Failed to decode value bytes as text.
    #[snafu(display("Could not decode text in {}: {}", tag, source))]
    DecodeText {
        /// The tag of the offending element.
        tag: Tag,
        /// The underlying text decoding error.
        #[snafu(backtrace)]
        source: DecodeTextError,
    },
    /// Failed to encode a text value into bytes.
    #[snafu(display("Could not encode text: {}", source))]
    EncodeText {
        /// The underlying text encoding error.
        #[snafu(backtrace)]
        source: EncodeTextError,
    },
    /// A value component exceeds the maximum length
    /// admitted by its value representation.
    #[snafu(display("Value of length {} too long for {} (maximum is {})", length, vr, max))]
    ValueTooLong {
        /// The value representation of the element being encoded.
        vr: VR,
        /// The byte length of the offending component.
        length: usize,
        /// The maximum length admitted by the value representation.
        max: u32,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// An encoded value is too large for the 16-bit length field
    /// of a short form explicit VR header.
    #[snafu(display(
        "Value length {} of {} {} does not fit in a short form header",
        length,
        tag,
        vr
    ))]
    HeaderOverflow {
        /// The tag of the element being encoded.
        tag: Tag,
        /// The value representation of the element being encoded.
        vr: VR,
        /// The byte length of the encoded value.
        length: u64,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// The in-memory value variant cannot be encoded
    /// under the element's value representation.
    #[snafu(display("Cannot encode {} value under VR {}", kind, vr))]
    MismatchedValue {
        /// The value representation of the element being encoded.
        vr: VR,
        /// The name of the in-memory value variant.
        kind: &'static str,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}

/// A result type with the crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
