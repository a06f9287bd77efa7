//! Decoding of TIFF/EXIF metadata directories.
//!
//! This crate reads the directory structure embedded in TIFF files and
//! TIFF-shaped blocks inside other containers: the byte-order header, the
//! chain of Image File Directories, the EXIF, GPS and interoperability
//! sub-directories, and the typed values their entries carry. It decodes
//! metadata only; image samples are out of scope.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> exifread::ExifResult<()> {
//! let file = BufReader::new(File::open("photo.tif")?);
//! let metadata = exifread::parse(file, 0)?;
//! for dir in &metadata.directories {
//!     print!("{dir}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Parsing is lenient by default: a malformed entry is dropped with a
//! [`Warning`] and the rest of the file is still decoded. [`Mode::Strict`]
//! turns format problems into errors for validation tooling.

pub mod decoder;
mod directory;
mod error;
mod geo;
pub mod tags;
mod value;

pub use self::decoder::{
    parse, ByteOrder, ByteSource, Decoder, Limits, MakerNoteStrategy, Mode, TiffHeader,
    XmpExtractor,
};
pub use self::directory::{IfdLabel, ImageFileDirectory, Metadata};
pub use self::error::{ExifError, ExifFormatError, ExifResult, Warning};
pub use self::geo::dms_to_decimal;
pub use self::value::{Rational, Value};
