//! Transfer syntax identification and its encoding properties.

use byteordered::Endianness;

/// The UID of the _Implicit VR Little Endian_ transfer syntax.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
/// The UID of the _Explicit VR Little Endian_ transfer syntax.
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
/// The UID of the _Deflated Explicit VR Little Endian_ transfer syntax.
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
/// The UID of the retired _Explicit VR Big Endian_ transfer syntax.
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";

/// An enumeration of the native transfer syntaxes,
/// determining byte order and data element header structure.
///
/// The deflated transfer syntax has no variant of its own:
/// once the data set stream is inflated, its content follows
/// [`TransferSyntax::ExplicitVrLittleEndian`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TransferSyntax {
    /// _Implicit VR Little Endian_, the default transfer syntax.
    ImplicitVrLittleEndian,
    /// _Explicit VR Little Endian_.
    ExplicitVrLittleEndian,
    /// _Explicit VR Big Endian_ (retired, still found in archives).
    ExplicitVrBigEndian,
}

impl Default for TransferSyntax {
    fn default() -> Self {
        TransferSyntax::ExplicitVrLittleEndian
    }
}

impl TransferSyntax {
    /// Identify a transfer syntax by its unique identifier.
    ///
    /// The deflated transfer syntax maps to
    /// [`TransferSyntax::ExplicitVrLittleEndian`],
    /// which is how its data set content is encoded after inflation.
    /// Unregistered identifiers yield `None`.
    pub fn from_uid(uid: &str) -> Option<Self> {
        match uid.trim_end_matches(|c| c == ' ' || c == '\0') {
            IMPLICIT_VR_LITTLE_ENDIAN => Some(TransferSyntax::ImplicitVrLittleEndian),
            EXPLICIT_VR_LITTLE_ENDIAN | DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN => {
                Some(TransferSyntax::ExplicitVrLittleEndian)
            }
            EXPLICIT_VR_BIG_ENDIAN => Some(TransferSyntax::ExplicitVrBigEndian),
            _ => None,
        }
    }

    /// The unique identifier of this transfer syntax.
    pub fn uid(self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => IMPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrLittleEndian => EXPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrBigEndian => EXPLICIT_VR_BIG_ENDIAN,
        }
    }

    /// The byte order of integers, floats, tags, and lengths.
    pub fn endianness(self) -> Endianness {
        match self {
            TransferSyntax::ExplicitVrBigEndian => Endianness::Big,
            _ => Endianness::Little,
        }
    }

    /// Whether data element headers carry an explicit value representation.
    pub fn explicit_vr(self) -> bool {
        !matches!(self, TransferSyntax::ImplicitVrLittleEndian)
    }
}
