//! The attribute dictionary collaborator:
//! a read-only lookup from tag to attribute name and value representation,
//! used to resolve VRs when decoding implicit-VR data sets.

use crate::tag::Tag;
use crate::vr::VR;
use std::fmt::Debug;

/// A dictionary entry with a static alias.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DictionaryEntryRef<'a> {
    /// The attribute tag.
    pub tag: Tag,
    /// The alias of the attribute, with no spaces, in UpperCamelCase.
    pub alias: &'a str,
    /// The typical value representation of the attribute.
    pub vr: VR,
}

/// Type trait for a dictionary of DICOM attributes.
///
/// The methods herein have no generic parameters,
/// so as to enable being used as a trait object.
pub trait DataDictionary: Debug {
    /// Fetch an entry by its tag.
    fn by_tag(&self, tag: Tag) -> Option<&DictionaryEntryRef<'static>>;

    /// Fetch an entry by its usual alias
    /// (e.g. "PatientName" or "SOPInstanceUID").
    /// Aliases are case sensitive.
    fn by_name(&self, name: &str) -> Option<&DictionaryEntryRef<'static>>;
}

macro_rules! entry {
    ($g: literal, $e: literal, $alias: literal, $vr: ident) => {
        DictionaryEntryRef {
            tag: Tag($g, $e),
            alias: $alias,
            vr: VR::$vr,
        }
    };
}

// Sorted by tag. A compact subset of PS3.6 covering the file meta group
// and the attributes this codec and its consumers touch in practice.
static ENTRIES: &[DictionaryEntryRef<'static>] = &[
    entry!(0x0002, 0x0001, "FileMetaInformationVersion", OB),
    entry!(0x0002, 0x0002, "MediaStorageSOPClassUID", UI),
    entry!(0x0002, 0x0003, "MediaStorageSOPInstanceUID", UI),
    entry!(0x0002, 0x0010, "TransferSyntaxUID", UI),
    entry!(0x0002, 0x0012, "ImplementationClassUID", UI),
    entry!(0x0002, 0x0013, "ImplementationVersionName", SH),
    entry!(0x0002, 0x0016, "SourceApplicationEntityTitle", AE),
    entry!(0x0008, 0x0005, "SpecificCharacterSet", CS),
    entry!(0x0008, 0x0008, "ImageType", CS),
    entry!(0x0008, 0x0012, "InstanceCreationDate", DA),
    entry!(0x0008, 0x0013, "InstanceCreationTime", TM),
    entry!(0x0008, 0x0016, "SOPClassUID", UI),
    entry!(0x0008, 0x0018, "SOPInstanceUID", UI),
    entry!(0x0008, 0x0020, "StudyDate", DA),
    entry!(0x0008, 0x0021, "SeriesDate", DA),
    entry!(0x0008, 0x0022, "AcquisitionDate", DA),
    entry!(0x0008, 0x0023, "ContentDate", DA),
    entry!(0x0008, 0x0030, "StudyTime", TM),
    entry!(0x0008, 0x0031, "SeriesTime", TM),
    entry!(0x0008, 0x0032, "AcquisitionTime", TM),
    entry!(0x0008, 0x0033, "ContentTime", TM),
    entry!(0x0008, 0x0050, "AccessionNumber", SH),
    entry!(0x0008, 0x0060, "Modality", CS),
    entry!(0x0008, 0x0070, "Manufacturer", LO),
    entry!(0x0008, 0x0080, "InstitutionName", LO),
    entry!(0x0008, 0x0090, "ReferringPhysicianName", PN),
    entry!(0x0008, 0x0100, "CodeValue", SH),
    entry!(0x0008, 0x0102, "CodingSchemeDesignator", SH),
    entry!(0x0008, 0x0104, "CodeMeaning", LO),
    entry!(0x0008, 0x1030, "StudyDescription", LO),
    entry!(0x0008, 0x103E, "SeriesDescription", LO),
    entry!(0x0008, 0x1090, "ManufacturerModelName", LO),
    entry!(0x0008, 0x1110, "ReferencedStudySequence", SQ),
    entry!(0x0008, 0x1115, "ReferencedSeriesSequence", SQ),
    entry!(0x0008, 0x1140, "ReferencedImageSequence", SQ),
    entry!(0x0008, 0x2112, "SourceImageSequence", SQ),
    entry!(0x0010, 0x0010, "PatientName", PN),
    entry!(0x0010, 0x0020, "PatientID", LO),
    entry!(0x0010, 0x0030, "PatientBirthDate", DA),
    entry!(0x0010, 0x0040, "PatientSex", CS),
    entry!(0x0010, 0x1010, "PatientAge", AS),
    entry!(0x0010, 0x1020, "PatientSize", DS),
    entry!(0x0010, 0x1030, "PatientWeight", DS),
    entry!(0x0010, 0x4000, "PatientComments", LT),
    entry!(0x0018, 0x0015, "BodyPartExamined", CS),
    entry!(0x0018, 0x0050, "SliceThickness", DS),
    entry!(0x0018, 0x0060, "KVP", DS),
    entry!(0x0018, 0x0088, "SpacingBetweenSlices", DS),
    entry!(0x0018, 0x1030, "ProtocolName", LO),
    entry!(0x0018, 0x1151, "XRayTubeCurrent", IS),
    entry!(0x0018, 0x5100, "PatientPosition", CS),
    entry!(0x0020, 0x000D, "StudyInstanceUID", UI),
    entry!(0x0020, 0x000E, "SeriesInstanceUID", UI),
    entry!(0x0020, 0x0010, "StudyID", SH),
    entry!(0x0020, 0x0011, "SeriesNumber", IS),
    entry!(0x0020, 0x0013, "InstanceNumber", IS),
    entry!(0x0020, 0x0032, "ImagePositionPatient", DS),
    entry!(0x0020, 0x0037, "ImageOrientationPatient", DS),
    entry!(0x0020, 0x0052, "FrameOfReferenceUID", UI),
    entry!(0x0020, 0x1041, "SliceLocation", DS),
    entry!(0x0020, 0x4000, "ImageComments", LT),
    entry!(0x0028, 0x0002, "SamplesPerPixel", US),
    entry!(0x0028, 0x0004, "PhotometricInterpretation", CS),
    entry!(0x0028, 0x0008, "NumberOfFrames", IS),
    entry!(0x0028, 0x0010, "Rows", US),
    entry!(0x0028, 0x0011, "Columns", US),
    entry!(0x0028, 0x0030, "PixelSpacing", DS),
    entry!(0x0028, 0x0100, "BitsAllocated", US),
    entry!(0x0028, 0x0101, "BitsStored", US),
    entry!(0x0028, 0x0102, "HighBit", US),
    entry!(0x0028, 0x0103, "PixelRepresentation", US),
    entry!(0x0028, 0x1050, "WindowCenter", DS),
    entry!(0x0028, 0x1051, "WindowWidth", DS),
    entry!(0x0028, 0x1052, "RescaleIntercept", DS),
    entry!(0x0028, 0x1053, "RescaleSlope", DS),
    entry!(0x0028, 0x2110, "LossyImageCompression", CS),
    entry!(0x0040, 0xA730, "ContentSequence", SQ),
    entry!(0x5200, 0x9229, "SharedFunctionalGroupsSequence", SQ),
    entry!(0x5200, 0x9230, "PerFrameFunctionalGroupsSequence", SQ),
    entry!(0x7FE0, 0x0010, "PixelData", OW),
];

/// A data dictionary with the common attributes of the DICOM standard,
/// held in a static sorted table and searched by bisection.
///
/// Group length elements (element number 0x0000) are not in the table;
/// they uniformly resolve to UL.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct StandardDataDictionary;

static GROUP_LENGTH_ENTRY: DictionaryEntryRef<'static> = DictionaryEntryRef {
    tag: Tag(0x0000, 0x0000),
    alias: "GroupLength",
    vr: VR::UL,
};

impl DataDictionary for StandardDataDictionary {
    fn by_tag(&self, tag: Tag) -> Option<&DictionaryEntryRef<'static>> {
        if tag.is_group_length() {
            return Some(&GROUP_LENGTH_ENTRY);
        }
        ENTRIES
            .binary_search_by_key(&u32::from(tag), |e| u32::from(e.tag))
            .ok()
            .map(|i| &ENTRIES[i])
    }

    fn by_name(&self, name: &str) -> Option<&DictionaryEntryRef<'static>> {
        ENTRIES.iter().find(|e| e.alias == name)
    }
}
