use std::fmt;
use std::io;

use quick_error::quick_error;

use crate::directory::IfdLabel;

quick_error! {
    /// Exif decoding error kinds.
    ///
    /// Header and I/O problems abort the parse with no partial result. Format
    /// problems are fatal only under [`Mode::Strict`](crate::Mode::Strict);
    /// the default lenient mode records them as [`Warning`]s instead.
    #[derive(Debug)]
    pub enum ExifError {
        /// The byte-order marker or magic of the TIFF header is invalid.
        MalformedHeader(reason: &'static str) {
            display("malformed TIFF header: {}", reason)
        }
        /// A seek or read against the byte source failed.
        Io(err: io::Error) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
        /// A directory entry could not be decoded.
        Format(err: ExifFormatError) {
            from()
            source(err)
            display("format error: {}", err)
        }
    }
}

quick_error! {
    /// Per-entry format problems.
    ///
    /// These abort the parse in strict mode; in lenient mode the offending
    /// entry is dropped with a warning and its siblings are unaffected.
    #[derive(Debug)]
    pub enum ExifFormatError {
        /// The 16-bit field type code has no entry in the type table.
        UnknownFieldType(code: u16, tag: u16) {
            display("unknown field type {} in tag 0x{:04x}", code, tag)
        }
        /// Fewer bytes were available than the entry declared.
        TruncatedData(offset: u64, expected: u64) {
            display("value truncated: {} bytes declared at offset {}", expected, offset)
        }
        /// The declared value size exceeds the configured decoding limit.
        ValueTooLarge(bytes: u64) {
            display("value of {} bytes exceeds the decoding limit", bytes)
        }
    }
}

/// Result of a metadata decoding process.
pub type ExifResult<T> = Result<T, ExifError>;

/// A non-fatal problem recorded during a parse.
///
/// A successful parse returns every directory that was decodable together
/// with the ordered list of warnings describing what was skipped or repaired
/// along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    /// The header magic was not 42. Only possible in lenient mode.
    BadMagic { value: u16 },
    /// An entry carried an unregistered field type code and was dropped.
    UnknownFieldType { ifd: IfdLabel, tag: u16, code: u16 },
    /// An indirected value ran past the end of the byte source.
    TruncatedData { ifd: IfdLabel, offset: u64, expected: u64 },
    /// An entry declared more value bytes than the decoding limit allows.
    ValueTooLarge { ifd: IfdLabel, bytes: u64 },
    /// An ASCII field held invalid UTF-8; a lossy string was substituted.
    Encoding { ifd: IfdLabel, tag: u16 },
    /// The directory chain revisited an offset and was truncated there.
    LoopDetected { offset: u64 },
    /// The external XMP extractor rejected the packet.
    Xmp { message: String },
}

impl Warning {
    pub(crate) fn from_format(ifd: IfdLabel, err: &ExifFormatError) -> Warning {
        match *err {
            ExifFormatError::UnknownFieldType(code, tag) => {
                Warning::UnknownFieldType { ifd, tag, code }
            }
            ExifFormatError::TruncatedData(offset, expected) => {
                Warning::TruncatedData { ifd, offset, expected }
            }
            ExifFormatError::ValueTooLarge(bytes) => Warning::ValueTooLarge { ifd, bytes },
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::BadMagic { value } => {
                write!(f, "header magic is {value}, expected 42")
            }
            Warning::UnknownFieldType { ifd, tag, code } => {
                write!(f, "{ifd}: unknown field type {code} in tag 0x{tag:04x}")
            }
            Warning::TruncatedData { ifd, offset, expected } => {
                write!(f, "{ifd}: value truncated, {expected} bytes declared at offset {offset}")
            }
            Warning::ValueTooLarge { ifd, bytes } => {
                write!(f, "{ifd}: value of {bytes} bytes exceeds the decoding limit")
            }
            Warning::Encoding { ifd, tag } => {
                write!(f, "{ifd}: invalid text encoding in tag 0x{tag:04x}")
            }
            Warning::LoopDetected { offset } => {
                write!(f, "directory chain loops back to offset {offset}")
            }
            Warning::Xmp { message } => write!(f, "XMP extraction failed: {message}"),
        }
    }
}
