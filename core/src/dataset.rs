//! The in-memory data set container and its elements.
//!
//! A [`DataSet`] maps attribute tags to owned data elements.
//! Insertion order is irrelevant: iteration always yields elements
//! in ascending tag order, which is also the order required
//! when serializing a data set.

use crate::header::Length;
use crate::tag::Tag;
use crate::value::{DicomValue, PrimitiveValue};
use crate::vr::VR;
use snafu::{Backtrace, Snafu};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// An error raised when looking up an element
/// which is not present in the data set.
#[derive(Debug, Snafu)]
#[snafu(display("No such data element {}", tag))]
pub struct NoSuchDataElement {
    /// The looked up tag.
    pub tag: Tag,
    /// The generated backtrace, if available.
    pub backtrace: Backtrace,
}

/// A data type that represents and owns a DICOM data element.
///
/// The element knows its tag, its value representation,
/// and a fully decoded value:
/// primitive, nested data sets (SQ),
/// or encapsulated pixel data fragments.
#[derive(Debug, PartialEq, Clone)]
pub struct DataElement {
    tag: Tag,
    vr: VR,
    value: DicomValue,
}

impl DataElement {
    /// Create a data element from the given parts.
    ///
    /// This method will not check whether the value representation
    /// is compatible with the given value.
    pub fn new<V>(tag: Tag, vr: VR, value: V) -> Self
    where
        V: Into<DicomValue>,
    {
        DataElement {
            tag,
            vr,
            value: value.into(),
        }
    }

    /// Create an empty data element.
    pub fn empty(tag: Tag, vr: VR) -> Self {
        DataElement {
            tag,
            vr,
            value: PrimitiveValue::Empty.into(),
        }
    }

    /// Retrieve the element's tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Retrieve the element's value representation.
    #[inline]
    pub fn vr(&self) -> VR {
        self.vr
    }

    /// Retrieve the data value.
    #[inline]
    pub fn value(&self) -> &DicomValue {
        &self.value
    }

    /// Move the data value out of the element, discarding the rest.
    pub fn into_value(self) -> DicomValue {
        self.value
    }

    /// Replace the element's value, keeping tag and VR.
    pub fn set_value<V>(&mut self, value: V)
    where
        V: Into<DicomValue>,
    {
        self.value = value.into();
    }
}

/// An in-memory DICOM data set:
/// an ordered map from attribute tags to data elements.
///
/// Inserting an element with a tag already present
/// replaces the previous element.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct DataSet {
    elements: BTreeMap<Tag, DataElement>,
}

impl DataSet {
    /// Create a new empty data set.
    pub fn new() -> Self {
        DataSet::default()
    }

    /// Insert a data element into the data set,
    /// replacing (and returning) any previous element of the same tag.
    pub fn put(&mut self, element: DataElement) -> Option<DataElement> {
        self.elements.insert(element.tag(), element)
    }

    /// Retrieve a particular data element by tag,
    /// or `None` if it is not present.
    pub fn get(&self, tag: Tag) -> Option<&DataElement> {
        self.elements.get(&tag)
    }

    /// Retrieve a particular data element by tag,
    /// raising an error if it is not present.
    pub fn element(&self, tag: Tag) -> Result<&DataElement, NoSuchDataElement> {
        self.get(tag).ok_or_else(|| NoSuchDataElementSnafu { tag }.build())
    }

    /// Check whether an element with the given tag is present.
    pub fn contains(&self, tag: Tag) -> bool {
        self.elements.contains_key(&tag)
    }

    /// Remove and return a particular data element by tag.
    pub fn remove(&mut self, tag: Tag) -> Option<DataElement> {
        self.elements.remove(&tag)
    }

    /// Insert or replace an element's value:
    /// if an element with the tag exists, only its value is replaced
    /// (the stored VR is kept);
    /// otherwise a new element is created with the given VR.
    pub fn update_value<V>(&mut self, tag: Tag, vr: VR, value: V)
    where
        V: Into<DicomValue>,
    {
        match self.elements.entry(tag) {
            btree_map::Entry::Occupied(mut e) => e.get_mut().set_value(value),
            btree_map::Entry::Vacant(e) => {
                e.insert(DataElement::new(tag, vr, value));
            }
        }
    }

    /// The number of top-level elements in the data set.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check whether the data set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the elements in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = &DataElement> {
        self.elements.values()
    }

    /// Iterate over the contained tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.elements.keys().copied()
    }

    /// Fetch the string value of an element, trimmed of trailing padding,
    /// or `None` if the element is absent or not textual.
    pub fn string_value(&self, tag: Tag) -> Option<&str> {
        self.get(tag)
            .and_then(|e| e.value().string().ok())
            .map(|s| s.trim_end_matches([' ', '\0']))
    }

    /// The total byte length of all element values is not tracked here;
    /// lengths are computed at encoding time. This reports the would-be
    /// length field of a sequence item holding this data set, which is
    /// always undefined in this implementation.
    pub fn length(&self) -> Length {
        Length::UNDEFINED
    }
}

impl IntoIterator for DataSet {
    type Item = DataElement;
    type IntoIter = btree_map::IntoValues<Tag, DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_values()
    }
}

impl FromIterator<DataElement> for DataSet {
    fn from_iter<T: IntoIterator<Item = DataElement>>(iter: T) -> Self {
        let mut ds = DataSet::new();
        for e in iter {
            ds.put(e);
        }
        ds
    }
}
