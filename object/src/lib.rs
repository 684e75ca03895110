//! This crate contains the highest level abstractions
//! for reading and writing DICOM content:
//! whole data sets under a chosen transfer syntax,
//! and complete Part 10 files with their preamble
//! and file meta information group.
//!
//! ## Examples
//!
//! Read a file from a byte buffer and fetch the patient's name:
//!
//! ```no_run
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use dcmio_core::Tag;
//! use dcmio_object::{DecodeOptions, DicomFile};
//!
//! let bytes = std::fs::read("0001.dcm")?;
//! let file = DicomFile::from_bytes(&bytes, &DecodeOptions::new())?;
//! let patient_name = file.dataset.element(Tag(0x0010, 0x0010))?.value().to_str();
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

use dcmio_core::Tag;
use snafu::{Backtrace, Snafu};

pub mod file;
pub mod read;
pub mod write;

pub use crate::file::DicomFile;
pub use crate::read::{read_data_set, DecodeOptions, MAX_SEQUENCE_DEPTH};
pub use crate::write::write_data_set;
pub use dcmio_encoding::{EncodeOptions, TransferSyntax};

/// An error which may occur when reading a data set or file.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum ReadError {
    /// The input does not start with a DICOM file preamble
    /// and "DICM" magic code.
    #[snafu(display("Not a DICOM file"))]
    NotDicom {
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// The file meta group does not start with
    /// its group length element (0002,0000).
    #[snafu(display("Missing file meta information group length"))]
    MissingMetaGroupLength {
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// Failed to decode a data element.
    #[snafu(display("Could not decode data element: {}", source))]
    DecodeElement {
        /// The underlying decoding error.
        #[snafu(backtrace)]
        source: dcmio_encoding::Error,
    },
    /// An item or delimiter tag appeared where it is not admitted.
    #[snafu(display("Unexpected delimitation tag {}", tag))]
    UnexpectedDelimiter {
        /// The offending tag.
        tag: Tag,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// A pixel data fragment or offset table item
    /// declared an undefined length.
    #[snafu(display("Pixel data item of {} declares an undefined length", tag))]
    UndefinedFragmentLength {
        /// The tag of the pixel data element.
        tag: Tag,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// Sequences are nested deeper than the decoder admits.
    #[snafu(display("Sequence nesting depth exceeds the maximum of {}", depth))]
    SequenceDepthExceeded {
        /// The maximum admitted depth.
        depth: u32,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// The data set declares a character set
    /// which this implementation does not support.
    #[snafu(display("Unsupported character set `{}`", name))]
    UnsupportedCharacterSet {
        /// The declared character set name.
        name: String,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// Failed to inflate a deflated data set stream.
    #[snafu(display("Could not inflate data set: {}", source))]
    Inflate {
        /// The underlying I/O error.
        source: std::io::Error,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}

/// An error which may occur when writing a data set or file.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum WriteError {
    /// Failed to encode a data element.
    #[snafu(display("Could not encode data element {}: {}", tag, source))]
    EncodeElement {
        /// The tag of the offending element.
        tag: Tag,
        /// The underlying encoding error.
        #[snafu(backtrace)]
        source: dcmio_encoding::Error,
    },
    /// Failed to deflate the data set stream.
    #[snafu(display("Could not deflate data set: {}", source))]
    Deflate {
        /// The underlying I/O error.
        source: std::io::Error,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}
