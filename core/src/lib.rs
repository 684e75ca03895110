//! This crate contains the core data structures
//! of the dcmio DICOM data set codec:
//! the attribute [tag](tag::Tag),
//! the [value representation](vr::VR) type system,
//! element headers and [lengths](header::Length),
//! decoded [values](value) and the [data set](dataset::DataSet) container,
//! and the read-only attribute [dictionary](dictionary).
//!
//! The encoding primitives live in `dcmio-encoding`
//! and the whole-data-set codec in `dcmio-object`.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod dataset;
pub mod dictionary;
pub mod header;
pub mod tag;
pub mod value;
pub mod vr;

pub use crate::dataset::{DataElement, DataSet};
pub use crate::dictionary::{DataDictionary, StandardDataDictionary};
pub use crate::header::{DataElementHeader, Length, SequenceItemHeader};
pub use crate::tag::Tag;
pub use crate::value::{DicomValue, PrimitiveValue, C};
pub use crate::vr::VR;
