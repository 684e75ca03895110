//! Value types for DICOM data elements:
//! primitive (possibly multi-valued) values,
//! sequences of nested data sets,
//! and encapsulated pixel data fragments.

use crate::dataset::DataSet;
use crate::tag::Tag;
use smallvec::SmallVec;
use snafu::{Backtrace, Snafu};
use std::borrow::Cow;
use std::fmt;

/// Helper type alias for multi-valued attribute containers.
pub type C<T> = SmallVec<[T; 2]>;

/// An error raised when retrieving a value
/// as a type other than the one it holds.
#[derive(Debug, Snafu)]
#[snafu(display("Cast failed: requested {} but value is {}", requested, got))]
pub struct CastValueError {
    /// The name of the requested value kind.
    pub requested: &'static str,
    /// The name of the kind effectively held.
    pub got: &'static str,
    /// The generated backtrace, if available.
    pub backtrace: Backtrace,
}

type Result<T, E = CastValueError> = std::result::Result<T, E>;

/// An enumeration of all memory representations
/// that a primitive (non-nested) DICOM value can take.
///
/// Multiple value components are kept in a [`C`] container,
/// which spills to the heap past two elements.
/// Text values are always held as UTF-8 strings,
/// already decoded from the data set's specific character set.
#[derive(Debug, PartialEq, Clone)]
pub enum PrimitiveValue {
    /// No value; the original element had a zero length.
    Empty,
    /// A sequence of strings, split from a multi-valued text element.
    Strs(C<String>),
    /// A single string.
    Str(String),
    /// A sequence of attribute tags.
    Tags(C<Tag>),
    /// A raw sequence of bytes.
    U8(C<u8>),
    /// A sequence of signed 16-bit integers.
    I16(C<i16>),
    /// A sequence of unsigned 16-bit integers.
    U16(C<u16>),
    /// A sequence of signed 32-bit integers.
    I32(C<i32>),
    /// A sequence of unsigned 32-bit integers.
    U32(C<u32>),
    /// A sequence of 32-bit floating point numbers.
    F32(C<f32>),
    /// A sequence of 64-bit floating point numbers.
    F64(C<f64>),
}

/// Macro for implementing getters to single and multi-values,
/// by matching on the corresponding variant.
macro_rules! impl_primitive_getters {
    ($name_single: ident, $name_multi: ident, $variant: ident, $ret: ty) => {
        /// Get a single value of the requested type.
        ///
        /// If it contains multiple values,
        /// only the first one is returned.
        /// An error is returned if the variant is not compatible.
        pub fn $name_single(&self) -> Result<$ret> {
            match self {
                PrimitiveValue::$variant(c) if !c.is_empty() => Ok(c[0]),
                value => CastValueSnafu {
                    requested: stringify!($name_single),
                    got: value.kind(),
                }
                .fail(),
            }
        }

        /// Get a sequence of values of the requested type without copying.
        ///
        /// An error is returned if the variant is not compatible.
        pub fn $name_multi(&self) -> Result<&[$ret]> {
            match self {
                PrimitiveValue::$variant(c) => Ok(c),
                value => CastValueSnafu {
                    requested: stringify!($name_multi),
                    got: value.kind(),
                }
                .fail(),
            }
        }
    };
}

impl PrimitiveValue {
    /// A short static name for the variant held, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            PrimitiveValue::Empty => "Empty",
            PrimitiveValue::Strs(_) => "Strs",
            PrimitiveValue::Str(_) => "Str",
            PrimitiveValue::Tags(_) => "Tags",
            PrimitiveValue::U8(_) => "U8",
            PrimitiveValue::I16(_) => "I16",
            PrimitiveValue::U16(_) => "U16",
            PrimitiveValue::I32(_) => "I32",
            PrimitiveValue::U32(_) => "U32",
            PrimitiveValue::F32(_) => "F32",
            PrimitiveValue::F64(_) => "F64",
        }
    }

    /// The number of individual value components held (the multiplicity).
    pub fn multiplicity(&self) -> usize {
        match self {
            PrimitiveValue::Empty => 0,
            PrimitiveValue::Str(_) => 1,
            PrimitiveValue::Strs(c) => c.len(),
            PrimitiveValue::Tags(c) => c.len(),
            PrimitiveValue::U8(c) => c.len(),
            PrimitiveValue::I16(c) => c.len(),
            PrimitiveValue::U16(c) => c.len(),
            PrimitiveValue::I32(c) => c.len(),
            PrimitiveValue::U32(c) => c.len(),
            PrimitiveValue::F32(c) => c.len(),
            PrimitiveValue::F64(c) => c.len(),
        }
    }

    /// Check whether the value holds nothing.
    pub fn is_empty(&self) -> bool {
        self.multiplicity() == 0
    }

    /// Render the value as a single string,
    /// joining multiple components with a backslash.
    /// Numbers are converted to their decimal text form.
    pub fn to_str(&self) -> Cow<str> {
        fn join<T: ToString>(c: &[T]) -> String {
            c.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\\")
        }
        match self {
            PrimitiveValue::Empty => Cow::Borrowed(""),
            PrimitiveValue::Str(s) => Cow::Borrowed(s.as_str()),
            PrimitiveValue::Strs(c) if c.len() == 1 => Cow::Borrowed(c[0].as_str()),
            PrimitiveValue::Strs(c) => Cow::Owned(c.join("\\")),
            PrimitiveValue::Tags(c) => {
                Cow::Owned(c.iter().map(|t| t.to_hex()).collect::<Vec<_>>().join("\\"))
            }
            PrimitiveValue::U8(c) => Cow::Owned(join(c)),
            PrimitiveValue::I16(c) => Cow::Owned(join(c)),
            PrimitiveValue::U16(c) => Cow::Owned(join(c)),
            PrimitiveValue::I32(c) => Cow::Owned(join(c)),
            PrimitiveValue::U32(c) => Cow::Owned(join(c)),
            PrimitiveValue::F32(c) => Cow::Owned(join(c)),
            PrimitiveValue::F64(c) => Cow::Owned(join(c)),
        }
    }

    /// Get a single string value.
    ///
    /// If the value holds multiple strings, only the first is returned.
    /// An error is returned if the variant is not textual.
    pub fn string(&self) -> Result<&str> {
        match self {
            PrimitiveValue::Str(s) => Ok(s),
            PrimitiveValue::Strs(c) if !c.is_empty() => Ok(&c[0]),
            value => CastValueSnafu {
                requested: "string",
                got: value.kind(),
            }
            .fail(),
        }
    }

    /// Get the inner sequence of string values
    /// if the variant is either `Str` or `Strs`.
    pub fn strings(&self) -> Result<Vec<&str>> {
        match self {
            PrimitiveValue::Str(s) => Ok(vec![s.as_str()]),
            PrimitiveValue::Strs(c) => Ok(c.iter().map(String::as_str).collect()),
            value => CastValueSnafu {
                requested: "strings",
                got: value.kind(),
            }
            .fail(),
        }
    }

    impl_primitive_getters!(tag, tags, Tags, Tag);
    impl_primitive_getters!(uint8, uint8_slice, U8, u8);
    impl_primitive_getters!(int16, int16_slice, I16, i16);
    impl_primitive_getters!(uint16, uint16_slice, U16, u16);
    impl_primitive_getters!(int32, int32_slice, I32, i32);
    impl_primitive_getters!(uint32, uint32_slice, U32, u32);
    impl_primitive_getters!(float32, float32_slice, F32, f32);
    impl_primitive_getters!(float64, float64_slice, F64, f64);
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::Str(value.to_owned())
    }
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::Str(value)
    }
}

impl From<Vec<String>> for PrimitiveValue {
    fn from(value: Vec<String>) -> Self {
        PrimitiveValue::Strs(value.into())
    }
}

impl From<Vec<&str>> for PrimitiveValue {
    fn from(value: Vec<&str>) -> Self {
        PrimitiveValue::Strs(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<Tag> for PrimitiveValue {
    fn from(value: Tag) -> Self {
        PrimitiveValue::Tags(smallvec::smallvec![value])
    }
}

macro_rules! impl_from_number {
    ($typ: ty, $variant: ident) => {
        impl From<$typ> for PrimitiveValue {
            fn from(value: $typ) -> Self {
                PrimitiveValue::$variant(smallvec::smallvec![value])
            }
        }

        impl From<Vec<$typ>> for PrimitiveValue {
            fn from(value: Vec<$typ>) -> Self {
                PrimitiveValue::$variant(value.into())
            }
        }
    };
}

impl_from_number!(u8, U8);
impl_from_number!(i16, I16);
impl_from_number!(u16, U16);
impl_from_number!(i32, I32);
impl_from_number!(u32, U32);
impl_from_number!(f32, F32);
impl_from_number!(f64, F64);

/// A DICOM element value: either a primitive value,
/// a sequence of nested data sets (SQ),
/// or an encapsulated pixel data sequence.
#[derive(Debug, PartialEq, Clone)]
pub enum DicomValue {
    /// A primitive, fully decoded value.
    Primitive(PrimitiveValue),
    /// A nested data set sequence.
    Sequence {
        /// The individual items of the sequence.
        items: Vec<DataSet>,
    },
    /// An encapsulated pixel data sequence.
    PixelSequence {
        /// The byte offset of each frame's first fragment,
        /// counted as in the Basic Offset Table.
        offset_table: C<u32>,
        /// One reassembled buffer per frame.
        fragments: Vec<Vec<u8>>,
    },
}

impl DicomValue {
    /// Create a sequence value from its items.
    pub fn new_sequence(items: Vec<DataSet>) -> Self {
        DicomValue::Sequence { items }
    }

    /// Create an encapsulated pixel data value from per-frame buffers.
    /// The offset table is rebuilt when the value is encoded.
    pub fn new_pixel_sequence(fragments: Vec<Vec<u8>>) -> Self {
        DicomValue::PixelSequence {
            offset_table: C::new(),
            fragments,
        }
    }

    /// Obtain the primitive value, if the variant holds one.
    pub fn primitive(&self) -> Result<&PrimitiveValue> {
        match self {
            DicomValue::Primitive(v) => Ok(v),
            value => CastValueSnafu {
                requested: "primitive",
                got: value.kind(),
            }
            .fail(),
        }
    }

    /// Obtain the sequence items, if the variant holds a sequence.
    pub fn items(&self) -> Result<&[DataSet]> {
        match self {
            DicomValue::Sequence { items } => Ok(items),
            value => CastValueSnafu {
                requested: "items",
                got: value.kind(),
            }
            .fail(),
        }
    }

    /// Obtain the pixel data frame buffers,
    /// if the variant holds an encapsulated pixel data value.
    pub fn fragments(&self) -> Result<&[Vec<u8>]> {
        match self {
            DicomValue::PixelSequence { fragments, .. } => Ok(fragments),
            value => CastValueSnafu {
                requested: "fragments",
                got: value.kind(),
            }
            .fail(),
        }
    }

    /// A short static name for the variant held, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DicomValue::Primitive(v) => v.kind(),
            DicomValue::Sequence { .. } => "Sequence",
            DicomValue::PixelSequence { .. } => "PixelSequence",
        }
    }

    /// Delegates to [`PrimitiveValue::string`].
    pub fn string(&self) -> Result<&str> {
        self.primitive()?.string()
    }

    /// Delegates to [`PrimitiveValue::to_str`];
    /// non-primitive values render as a placeholder.
    pub fn to_str(&self) -> Cow<str> {
        match self {
            DicomValue::Primitive(v) => v.to_str(),
            DicomValue::Sequence { items } => Cow::Owned(format!("<sequence of {}>", items.len())),
            DicomValue::PixelSequence { fragments, .. } => {
                Cow::Owned(format!("<pixel data of {} frames>", fragments.len()))
            }
        }
    }
}

impl From<PrimitiveValue> for DicomValue {
    fn from(value: PrimitiveValue) -> Self {
        DicomValue::Primitive(value)
    }
}

impl From<&str> for DicomValue {
    fn from(value: &str) -> Self {
        DicomValue::Primitive(value.into())
    }
}

impl From<String> for DicomValue {
    fn from(value: String) -> Self {
        DicomValue::Primitive(value.into())
    }
}

impl From<Vec<String>> for DicomValue {
    fn from(value: Vec<String>) -> Self {
        DicomValue::Primitive(value.into())
    }
}

impl From<Vec<&str>> for DicomValue {
    fn from(value: Vec<&str>) -> Self {
        DicomValue::Primitive(value.into())
    }
}

macro_rules! impl_value_from_number {
    ($typ: ty) => {
        impl From<$typ> for DicomValue {
            fn from(value: $typ) -> Self {
                DicomValue::Primitive(value.into())
            }
        }

        impl From<Vec<$typ>> for DicomValue {
            fn from(value: Vec<$typ>) -> Self {
                DicomValue::Primitive(value.into())
            }
        }
    };
}

impl_value_from_number!(u8);
impl_value_from_number!(i16);
impl_value_from_number!(u16);
impl_value_from_number!(i32);
impl_value_from_number!(u32);
impl_value_from_number!(f32);
impl_value_from_number!(f64);

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn primitive_to_str() {
        assert_eq!(PrimitiveValue::from("Doe^John").to_str(), "Doe^John");
        assert_eq!(
            PrimitiveValue::Strs(smallvec!["A".into(), "B".into(), "C".into()]).to_str(),
            "A\\B\\C"
        );
        assert_eq!(
            PrimitiveValue::U16(smallvec![256, 0, 16]).to_str(),
            "256\\0\\16"
        );
        assert_eq!(PrimitiveValue::Empty.to_str(), "");
    }

    #[test]
    fn primitive_getters() {
        let v = PrimitiveValue::from(vec![10u16, 11]);
        assert_eq!(v.uint16().unwrap(), 10);
        assert_eq!(v.uint16_slice().unwrap(), &[10, 11]);
        assert!(v.float64().is_err());
        assert_eq!(v.multiplicity(), 2);
    }

    #[test]
    fn value_conversions() {
        assert_eq!(
            DicomValue::from(vec![0u8, 1]),
            DicomValue::Primitive(PrimitiveValue::U8(smallvec![0, 1]))
        );
        assert_eq!(
            DicomValue::from(vec!["ORIGINAL", "PRIMARY"]),
            DicomValue::Primitive(PrimitiveValue::Strs(smallvec![
                "ORIGINAL".into(),
                "PRIMARY".into()
            ]))
        );
        assert_eq!(
            DicomValue::from(512u16),
            DicomValue::Primitive(PrimitiveValue::U16(smallvec![512]))
        );
    }

    #[test]
    fn value_casts() {
        let v = DicomValue::from("1.2.3");
        assert_eq!(v.string().unwrap(), "1.2.3");
        assert!(v.items().is_err());

        let seq = DicomValue::new_sequence(vec![DataSet::new()]);
        assert_eq!(seq.items().unwrap().len(), 1);
        assert!(seq.primitive().is_err());
    }
}
