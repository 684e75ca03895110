//! Reading and writing complete DICOM files:
//! the 128-byte preamble, the "DICM" magic code,
//! the file meta information group, and the main data set.
//!
//! The file meta group is always encoded in Explicit VR Little Endian,
//! regardless of the transfer syntax it declares for the data set.

use std::io::{Read, Write};

use byteordered::Endianness;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use snafu::{ensure, ResultExt};
use tracing::warn;

use dcmio_core::{DataElement, DataSet, DicomValue, Length, PrimitiveValue, StandardDataDictionary, Tag, C, VR};
use dcmio_encoding::cursor::{ReadCursor, WriteCursor};
use dcmio_encoding::decode::decode_header;
use dcmio_encoding::encode::encode_header;
use dcmio_encoding::transfer_syntax::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN;
use dcmio_encoding::{EncodeOptions, TransferSyntax};

use crate::read::{read_data_set, DecodeOptions};
use crate::write::write_data_set;
use crate::{
    DecodeElementSnafu, DeflateSnafu, EncodeElementSnafu, InflateSnafu,
    MissingMetaGroupLengthSnafu, NotDicomSnafu, ReadError, WriteError,
};

const PREAMBLE_LENGTH: usize = 128;
const MAGIC_CODE: &[u8; 4] = b"DICM";

/// The UID under which this implementation identifies itself
/// in the file meta group.
pub const IMPLEMENTATION_CLASS_UID: &str = "1.2.826.0.1.3680043.10.1451.1";
/// The version name under which this implementation identifies itself
/// in the file meta group.
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMIO_0_1";

/// A complete in-memory DICOM file:
/// the file meta information group and the main data set.
///
/// The declared Transfer Syntax UID (0002,0010) in the meta group
/// governs how the data set is decoded and encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct DicomFile {
    /// The file meta information group (all elements of group 0002).
    pub meta: DataSet,
    /// The main data set.
    pub dataset: DataSet,
}

impl DicomFile {
    /// Create a file around the given data set,
    /// building a minimal file meta group
    /// declaring the given transfer syntax UID.
    ///
    /// The media storage SOP class and instance UIDs
    /// are mirrored from the data set when present.
    pub fn new(dataset: DataSet, transfer_syntax_uid: &str) -> Self {
        let mut meta = DataSet::new();
        meta.put(DataElement::new(
            Tag(0x0002, 0x0001),
            VR::OB,
            PrimitiveValue::U8(C::from_slice(&[0x00, 0x01])),
        ));
        if let Some(uid) = dataset.string_value(Tag(0x0008, 0x0016)) {
            meta.put(DataElement::new(Tag(0x0002, 0x0002), VR::UI, uid));
        }
        if let Some(uid) = dataset.string_value(Tag(0x0008, 0x0018)) {
            meta.put(DataElement::new(Tag(0x0002, 0x0003), VR::UI, uid));
        }
        meta.put(DataElement::new(
            Tag::TRANSFER_SYNTAX_UID,
            VR::UI,
            transfer_syntax_uid,
        ));
        meta.put(DataElement::new(
            Tag(0x0002, 0x0012),
            VR::UI,
            IMPLEMENTATION_CLASS_UID,
        ));
        meta.put(DataElement::new(
            Tag(0x0002, 0x0013),
            VR::SH,
            IMPLEMENTATION_VERSION_NAME,
        ));
        DicomFile { meta, dataset }
    }

    /// Read a complete DICOM file from a byte buffer.
    pub fn from_bytes(bytes: &[u8], options: &DecodeOptions) -> Result<Self, ReadError> {
        ensure!(
            bytes.len() >= PREAMBLE_LENGTH + MAGIC_CODE.len()
                && &bytes[PREAMBLE_LENGTH..PREAMBLE_LENGTH + MAGIC_CODE.len()] == MAGIC_CODE,
            NotDicomSnafu
        );
        let mut cursor = ReadCursor::new(
            &bytes[PREAMBLE_LENGTH + MAGIC_CODE.len()..],
            Endianness::Little,
        );

        // the group length element bounds the rest of the meta group
        let header = decode_header(
            &mut cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &StandardDataDictionary,
        )
        .context(DecodeElementSnafu)?;
        ensure!(
            header.tag == Tag::FILE_META_GROUP_LENGTH && header.len == Length(4),
            MissingMetaGroupLengthSnafu
        );
        let group_length = cursor
            .read_u32()
            .context(dcmio_encoding::error::OutOfRangeSnafu)
            .context(DecodeElementSnafu)?;

        let mut meta_cursor = cursor
            .sub_cursor(group_length as usize)
            .context(dcmio_encoding::error::OutOfRangeSnafu)
            .context(DecodeElementSnafu)?;
        // the stop tag applies to the main data set only,
        // but the lenience switch covers the whole parse
        let meta_options = DecodeOptions {
            ignore_errors: options.ignore_errors,
            ..DecodeOptions::new()
        };
        let mut meta = read_data_set(
            &mut meta_cursor,
            TransferSyntax::ExplicitVrLittleEndian,
            &meta_options,
        )?;
        meta.put(DataElement::new(
            Tag::FILE_META_GROUP_LENGTH,
            VR::UL,
            PrimitiveValue::from(group_length),
        ));

        let uid = meta
            .string_value(Tag::TRANSFER_SYNTAX_UID)
            .unwrap_or_else(|| {
                warn!("missing transfer syntax UID, assuming explicit VR little endian");
                TransferSyntax::ExplicitVrLittleEndian.uid()
            })
            .to_owned();

        let dataset = if uid == DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN {
            let deflated = cursor
                .take(cursor.remaining())
                .context(dcmio_encoding::error::OutOfRangeSnafu)
                .context(DecodeElementSnafu)?;
            let mut inflated = Vec::new();
            DeflateDecoder::new(deflated)
                .read_to_end(&mut inflated)
                .context(InflateSnafu)?;
            let mut data_cursor = ReadCursor::new(&inflated, Endianness::Little);
            read_data_set(
                &mut data_cursor,
                TransferSyntax::ExplicitVrLittleEndian,
                options,
            )?
        } else {
            let ts = TransferSyntax::from_uid(&uid).unwrap_or_else(|| {
                warn!(
                    "unrecognized transfer syntax `{}`, reading as explicit VR little endian",
                    uid
                );
                TransferSyntax::ExplicitVrLittleEndian
            });
            cursor.set_endianness(ts.endianness());
            read_data_set(&mut cursor, ts, options)?
        };

        Ok(DicomFile { meta, dataset })
    }

    /// Encode the complete file into a byte buffer:
    /// a zeroed preamble, the magic code,
    /// the meta group with a regenerated group length,
    /// and the data set under the declared transfer syntax.
    pub fn to_bytes(&self, options: &EncodeOptions) -> Result<Vec<u8>, WriteError> {
        let uid = self
            .meta
            .string_value(Tag::TRANSFER_SYNTAX_UID)
            .unwrap_or_else(|| {
                warn!("missing transfer syntax UID, writing as explicit VR little endian");
                TransferSyntax::ExplicitVrLittleEndian.uid()
            })
            .to_owned();
        let deflated = uid == DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN;
        let ts = TransferSyntax::from_uid(&uid).unwrap_or_else(|| {
            warn!(
                "unrecognized transfer syntax `{}`, writing as explicit VR little endian",
                uid
            );
            TransferSyntax::ExplicitVrLittleEndian
        });

        let mut data = WriteCursor::new(ts.endianness());
        write_data_set(&self.dataset, &mut data, ts, options)?;
        let data = if deflated {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
            encoder.write_all(data.as_slice()).context(DeflateSnafu)?;
            encoder.finish().context(DeflateSnafu)?
        } else {
            data.into_vec()
        };

        // the group length element is regenerated, never copied through
        let meta_rest: DataSet = self
            .meta
            .iter()
            .filter(|e| e.tag() != Tag::FILE_META_GROUP_LENGTH)
            .cloned()
            .collect();
        let mut meta_body = WriteCursor::new(Endianness::Little);
        write_data_set(
            &meta_rest,
            &mut meta_body,
            TransferSyntax::ExplicitVrLittleEndian,
            options,
        )?;

        let mut out = WriteCursor::with_capacity(
            PREAMBLE_LENGTH + MAGIC_CODE.len() + 12 + meta_body.len() + data.len(),
            Endianness::Little,
        );
        out.write_bytes(&[0u8; PREAMBLE_LENGTH]);
        out.write_bytes(MAGIC_CODE);
        encode_header(
            &mut out,
            Tag::FILE_META_GROUP_LENGTH,
            VR::UL,
            Length(4),
            TransferSyntax::ExplicitVrLittleEndian,
        )
        .context(EncodeElementSnafu {
            tag: Tag::FILE_META_GROUP_LENGTH,
        })?;
        out.write_u32(meta_body.len() as u32);
        out.concat(meta_body);
        out.write_bytes(&data);
        Ok(out.into_vec())
    }

    /// The transfer syntax declared in the file meta group,
    /// defaulting to Explicit VR Little Endian
    /// when absent or unrecognized.
    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.transfer_syntax_uid()
            .and_then(TransferSyntax::from_uid)
            .unwrap_or_default()
    }

    /// The Transfer Syntax UID (0002,0010) declared in the meta group.
    pub fn transfer_syntax_uid(&self) -> Option<&str> {
        self.meta.string_value(Tag::TRANSFER_SYNTAX_UID)
    }

    /// Insert or replace the value of a data set element,
    /// keeping its current VR when it already exists.
    pub fn update_value<V>(&mut self, tag: Tag, vr: VR, value: V)
    where
        V: Into<DicomValue>,
    {
        self.dataset.update_value(tag, vr, value);
    }
}
