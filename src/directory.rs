use std::collections::BTreeMap;
use std::fmt;

use crate::decoder::TiffHeader;
use crate::error::Warning;
use crate::tags::tag_name;
use crate::value::Value;

/// Identifies which directory of the chain an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IfdLabel {
    /// A directory of the top-level chain; `Ifd(0)` is the primary image,
    /// `Ifd(1)` conventionally the thumbnail.
    Ifd(u16),
    /// The EXIF-private sub-directory reached through tag 0x8769.
    Exif,
    /// The GPS sub-directory reached through tag 0x8825.
    Gps,
    /// The interoperability sub-directory reached from inside the Exif IFD.
    Interop,
    /// A vendor MakerNote decoded through the offset-rebasing hook.
    MakerNote,
}

impl fmt::Display for IfdLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IfdLabel::Ifd(n) => write!(f, "IFD{n}"),
            IfdLabel::Exif => write!(f, "ExifIFD"),
            IfdLabel::Gps => write!(f, "GPSIFD"),
            IfdLabel::Interop => write!(f, "InteropIFD"),
            IfdLabel::MakerNote => write!(f, "MakerNoteIFD"),
        }
    }
}

/// One decoded Image File Directory.
///
/// Entries are kept in on-disk order. The format does not guarantee unique
/// tag ids within a directory, so [`get`](Self::get) resolves duplicates by
/// letting a later entry overwrite an earlier one, while iteration still
/// yields the raw sequence.
#[derive(Debug, Clone)]
pub struct ImageFileDirectory {
    pub(crate) offset: u64,
    pub(crate) label: IfdLabel,
    pub(crate) entries: Vec<(u16, Value)>,
}

impl ImageFileDirectory {
    /// Absolute offset of the directory's 2-byte entry count.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn label(&self) -> IfdLabel {
        self.label
    }

    /// Number of decoded entries. Entries dropped in lenient mode are not
    /// counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The value of a tag; with duplicate ids the last entry wins.
    pub fn get(&self, tag: u16) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(id, _)| *id == tag)
            .map(|(_, value)| value)
    }

    /// Entries in on-disk order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Value)> + '_ {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    /// Entries with their dictionary names resolved, in on-disk order.
    pub fn named_entries(&self) -> impl Iterator<Item = (String, &Value)> + '_ {
        self.entries
            .iter()
            .map(|(id, value)| (tag_name(self.label, *id), value))
    }
}

impl fmt::Display for ImageFileDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.named_entries() {
            writeln!(f, "{}: {name}: {value}", self.label)?;
        }
        Ok(())
    }
}

/// The result of a parse.
///
/// Owns everything it refers to; the byte source can be dropped once this
/// exists.
#[derive(Debug)]
pub struct Metadata {
    pub header: TiffHeader,
    /// Decoded directories in traversal order: the top-level chain first,
    /// then sub-directory expansions.
    pub directories: Vec<ImageFileDirectory>,
    /// Non-fatal problems, in the order they were encountered.
    pub warnings: Vec<Warning>,
    /// String-keyed values returned by the external XMP extractor, empty
    /// unless one was configured and a packet was found.
    pub xmp: BTreeMap<String, String>,
}

impl Metadata {
    /// The first directory carrying `label`, if it was decoded.
    pub fn directory(&self, label: IfdLabel) -> Option<&ImageFileDirectory> {
        self.directories.iter().find(|d| d.label == label)
    }

    /// Looks a tag up in the directory carrying `label`.
    pub fn find(&self, label: IfdLabel, tag: u16) -> Option<&Value> {
        self.directory(label)?.get(tag)
    }
}
