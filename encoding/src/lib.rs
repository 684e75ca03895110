//! This crate contains the primitives for encoding and decoding
//! DICOM data element content over in-memory buffers:
//! bounded byte cursors, header and value codecs
//! for the native transfer syntaxes, and text repertoire support.
//!
//! Full data set and file level reading and writing
//! is built on top of these primitives in `dcmio-object`.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cursor;
pub mod decode;
pub mod encode;
pub mod error;
pub mod text;
pub mod transfer_syntax;
pub mod value_read;
pub mod value_write;

pub use crate::cursor::{ReadCursor, WriteCursor};
pub use crate::error::{Error, Result};
pub use crate::text::{SpecificCharacterSet, TextCodec};
pub use crate::transfer_syntax::TransferSyntax;
pub use crate::value_write::EncodeOptions;

// re-export the byte order type used across the crate's interfaces
pub use byteordered::Endianness;
