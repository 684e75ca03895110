//! The DICOM value representation type system.
//!
//! Every data element carries one of the value representations in [`VR`],
//! which fixes how its value bytes are laid out on the wire:
//! header form (short or long length field), fixed scalar width,
//! backslash-separated multiplicity, padding byte,
//! and the maximum accepted value length.

use std::fmt;
use std::str::{from_utf8, FromStr};

/// An enum type for a DICOM value representation.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Float
    OF,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier (UID)
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Locator (URI/URL)
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
}

impl VR {
    /// Obtain the value representation corresponding to the given two bytes.
    /// Each byte should represent an alphabetic character in upper case.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(chars.as_ref())
            .ok()
            .and_then(|s| VR::from_str(s).ok())
    }

    /// Retrieve a string representation of this VR.
    pub fn to_str(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OF => "OF",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
        }
    }

    /// Retrieve a copy of this VR's byte representation.
    /// The function returns two alphabetic characters in upper case.
    pub fn to_bytes(self) -> [u8; 2] {
        let bytes = self.to_str().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// Whether the explicit-VR header of this representation
    /// uses the long form: two reserved bytes followed by a
    /// 4-byte length field, rather than a 2-byte length field.
    pub fn is_explicit_long(self) -> bool {
        use VR::*;
        matches!(self, OB | OF | OW | SQ | UC | UR | UT | UN)
    }

    /// The fixed byte width of one scalar value,
    /// for the binary numeric and tag representations.
    /// A declared length spanning multiple widths
    /// holds that many values in succession.
    pub fn fixed_width(self) -> Option<usize> {
        use VR::*;
        match self {
            AT => Some(4),
            FL => Some(4),
            FD => Some(8),
            SL => Some(4),
            SS => Some(2),
            UL => Some(4),
            US => Some(2),
            _ => None,
        }
    }

    /// Whether values of this representation hold multiple components
    /// separated by the backslash byte (0x5C).
    pub fn splits_on_backslash(self) -> bool {
        use VR::*;
        matches!(self, AE | AS | CS | DA | DS | DT | IS | TM | UI | UR)
    }

    /// Whether values of this representation are text
    /// in the data set's specific character set.
    /// Such values are never split on backslashes,
    /// even if the byte appears in the data.
    pub fn is_encoded_string(self) -> bool {
        use VR::*;
        matches!(self, LO | LT | PN | SH | ST | UC | UT)
    }

    /// Whether values of this representation are text of any kind.
    pub fn is_string(self) -> bool {
        self.splits_on_backslash() || self.is_encoded_string()
    }

    /// The byte used to pad a value of this representation
    /// to an even length: space for text, NUL otherwise
    /// (including unique identifiers).
    pub fn padding(self) -> u8 {
        if self == VR::UI {
            0x00
        } else if self.is_string() {
            b' '
        } else {
            0x00
        }
    }

    /// The maximum accepted byte length of a single value,
    /// where the standard restricts it.
    pub fn max_length(self) -> Option<u32> {
        use VR::*;
        match self {
            AE => Some(16),
            AS => Some(4),
            CS => Some(16),
            DA => Some(8),
            DS => Some(16),
            DT => Some(26),
            IS => Some(12),
            LO => Some(64),
            LT => Some(10240),
            PN => Some(64),
            SH => Some(16),
            ST => Some(1024),
            TM => Some(14),
            UI => Some(64),
            _ => None,
        }
    }
}

/// Obtain the value representation corresponding to the given string.
/// The string should hold exactly two UTF-8 encoded alphabetic characters
/// in upper case, otherwise no match is made.
impl FromStr for VR {
    type Err = &'static str;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use VR::*;
        match string {
            "AE" => Ok(AE),
            "AS" => Ok(AS),
            "AT" => Ok(AT),
            "CS" => Ok(CS),
            "DA" => Ok(DA),
            "DS" => Ok(DS),
            "DT" => Ok(DT),
            "FL" => Ok(FL),
            "FD" => Ok(FD),
            "IS" => Ok(IS),
            "LO" => Ok(LO),
            "LT" => Ok(LT),
            "OB" => Ok(OB),
            "OF" => Ok(OF),
            "OW" => Ok(OW),
            "PN" => Ok(PN),
            "SH" => Ok(SH),
            "SL" => Ok(SL),
            "SQ" => Ok(SQ),
            "SS" => Ok(SS),
            "ST" => Ok(ST),
            "TM" => Ok(TM),
            "UC" => Ok(UC),
            "UI" => Ok(UI),
            "UL" => Ok(UL),
            "UN" => Ok(UN),
            "UR" => Ok(UR),
            "US" => Ok(US),
            "UT" => Ok(UT),
            _ => Err("no such value representation"),
        }
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(VR::to_str(*self))
    }
}
