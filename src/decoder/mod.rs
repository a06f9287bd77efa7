//! Decoding of TIFF/EXIF metadata directories.

use std::borrow::Cow;
use std::collections::BTreeMap;

use tracing::warn;

use crate::directory::{IfdLabel, ImageFileDirectory, Metadata};
use crate::error::{ExifError, ExifResult, Warning};
use crate::tags::Tag;
use crate::value::Value;

mod cycles;
mod entry;
mod stream;

pub use self::stream::{ByteOrder, ByteSource};

use self::cycles::ChainGuard;
use self::entry::Entry;
use self::stream::SourceReader;

const TIFF_MAGIC: u16 = 42;

/// Operating mode of the decoder.
///
/// Lenient is the default: per-entry problems are recorded as warnings and
/// the rest of the file is still decoded. Strict is for validation tooling
/// that wants the first format problem to abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Strict,
    #[default]
    Lenient,
}

/// Decoding limits.
#[derive(Clone, Debug)]
pub struct Limits {
    /// The maximum number of bytes materialized for any single entry value,
    /// the default is 1MiB. Offsets and counts come from the file and are
    /// attacker-controlled; this bounds what a single entry can allocate.
    pub ifd_value_size: usize,
    /// Prevents exhaustive construction so that adding fields is not a
    /// breaking change.
    _non_exhaustive: (),
}

impl Limits {
    /// A configuration that does not impose any limits.
    pub fn unlimited() -> Limits {
        Limits {
            ifd_value_size: usize::MAX,
            _non_exhaustive: (),
        }
    }
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            ifd_value_size: 1024 * 1024,
            _non_exhaustive: (),
        }
    }
}

/// The parsed header of a TIFF block.
///
/// Created once per parse and read-only afterwards. All raw offsets inside
/// the block are relative to `base_offset`; the fields here are absolute.
#[derive(Debug, Clone, Copy)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    /// Absolute offset where the TIFF block begins ("II"/"MM" marker).
    pub base_offset: u64,
    /// Absolute offset of IFD0.
    pub ifd0_offset: u64,
    /// Signed correction added to every offset resolved after the header:
    /// next-IFD pointers, sub-directory pointers and indirected values. For
    /// containers whose embedded block anchors offsets somewhere other than
    /// `base_offset`.
    pub adjustment: i64,
}

/// Computes the offset correction for entries decoded inside a vendor
/// MakerNote.
///
/// Some vendors anchor indirected values relative to the MakerNote itself
/// rather than the TIFF block. A strategy inspects the camera make (from
/// IFD0) and the note's absolute offset and yields the signed adjustment to
/// apply, or `None` when the vendor convention is unknown, in which case
/// offsets are treated as block-relative and decoding proceeds best-effort.
pub trait MakerNoteStrategy {
    fn adjustment(&self, make: &str, note_offset: u64) -> Option<i64>;
}

/// External XMP collaborator.
///
/// The decoder never parses XML/RDF itself. When IFD0 carries an XMP packet
/// tag, the raw block is handed over opaquely and the returned string-keyed
/// mapping is stored under the reserved `xmp` namespace of [`Metadata`].
pub trait XmpExtractor {
    fn extract(&self, packet: &[u8]) -> Result<BTreeMap<String, String>, String>;
}

/// The representation of a metadata decoder.
///
/// A decoder borrows its byte source for the duration of one parse; the
/// [`Metadata`] it produces holds no reference back into the source.
pub struct Decoder<S> {
    source: S,
    base_offset: u64,
    adjustment: i64,
    mode: Mode,
    limits: Limits,
    makernote: Option<Box<dyn MakerNoteStrategy>>,
    xmp: Option<Box<dyn XmpExtractor>>,
}

/// Decodes the metadata directories of a TIFF block starting at
/// `base_offset`, with lenient defaults.
pub fn parse<S: ByteSource>(source: S, base_offset: u64) -> ExifResult<Metadata> {
    Decoder::new(source, base_offset).read_metadata()
}

/// A decoded directory plus the chain bookkeeping the walker needs.
struct DirectoryNode {
    dir: ImageFileDirectory,
    /// Raw (block-relative) offset of the next IFD; 0 ends the chain.
    next: u32,
    /// Absolute offset of an indirected MakerNote payload, when present.
    note_offset: Option<u64>,
}

impl<S: ByteSource> Decoder<S> {
    pub fn new(source: S, base_offset: u64) -> Decoder<S> {
        Decoder {
            source,
            base_offset,
            adjustment: 0,
            mode: Mode::default(),
            limits: Limits::default(),
            makernote: None,
            xmp: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the synthetic offset correction for embedded containers whose
    /// sub-offsets are anchored away from the block start. The correction is
    /// applied uniformly to next-IFD pointers, sub-directory pointers and
    /// indirected values; only the IFD0 offset in the header is exempt.
    pub fn with_adjustment(mut self, adjustment: i64) -> Self {
        self.adjustment = adjustment;
        self
    }

    pub fn with_makernote(mut self, strategy: Box<dyn MakerNoteStrategy>) -> Self {
        self.makernote = Some(strategy);
        self
    }

    pub fn with_xmp(mut self, extractor: Box<dyn XmpExtractor>) -> Self {
        self.xmp = Some(extractor);
        self
    }

    /// Runs the parse: header, top-level chain, sub-directory expansions.
    pub fn read_metadata(mut self) -> ExifResult<Metadata> {
        let mut warnings = Vec::new();
        let header = self.read_header(&mut warnings)?;

        let mut guard = ChainGuard::new();
        let mut directories = Vec::new();
        let mut xmp = BTreeMap::new();

        // Top-level chain: IFD0, IFD1, ...
        let mut next = Some(header.ifd0_offset);
        let mut index = 0u16;
        while let Some(offset) = next {
            if !guard.visit(offset) {
                warn!(offset, "directory chain loops back, truncating");
                warnings.push(Warning::LoopDetected { offset });
                break;
            }
            let node = match self.read_directory(
                &header,
                offset,
                IfdLabel::Ifd(index),
                header.adjustment,
                &mut warnings,
            ) {
                Ok(node) => node,
                Err(err) => {
                    self.directory_failed(IfdLabel::Ifd(index), err, &mut warnings)?;
                    break;
                }
            };
            directories.push(node.dir);
            next = match node.next {
                0 => None,
                n => resolve_offset(&header, u64::from(n)),
            };
            // The label index is 16 bits; a longer chain is cut off there.
            index = match index.checked_add(1) {
                Some(i) => i,
                None => break,
            };
        }

        // Exif and GPS pointers live in the top-level directories.
        let mut expansions = Vec::new();
        for dir in &directories {
            if let Some(offset) = directory_pointer(dir, Tag::ExifDirectory, &header) {
                expansions.push((offset, IfdLabel::Exif));
            }
            if let Some(offset) = directory_pointer(dir, Tag::GpsDirectory, &header) {
                expansions.push((offset, IfdLabel::Gps));
            }
        }

        let make = directories
            .first()
            .and_then(|ifd0| ifd0.get(Tag::Make.to_u16()))
            .and_then(Value::as_str)
            .map(str::to_owned);

        for (offset, label) in expansions {
            let Some(node) = self.expand(&header, offset, label, &mut guard, &mut warnings)?
            else {
                continue;
            };
            let note_offset = node.note_offset;
            let is_exif = label == IfdLabel::Exif;
            directories.push(node.dir);

            if !is_exif {
                continue;
            }

            // The interoperability pointer is only found inside the Exif IFD.
            let interop = directories
                .last()
                .and_then(|d| directory_pointer(d, Tag::InteropDirectory, &header));
            if let Some(offset) = interop {
                if let Some(node) =
                    self.expand(&header, offset, IfdLabel::Interop, &mut guard, &mut warnings)?
                {
                    directories.push(node.dir);
                }
            }

            // The MakerNote is only decoded as a directory when a vendor
            // strategy is configured; otherwise its bytes stay opaque.
            let note = match (self.makernote.as_deref(), note_offset) {
                (Some(strategy), Some(note_offset)) => {
                    let adjust = make
                        .as_deref()
                        .and_then(|m| strategy.adjustment(m, note_offset))
                        .unwrap_or(0);
                    Some((note_offset, adjust))
                }
                _ => None,
            };
            if let Some((note_offset, adjust)) = note {
                if let Some(node) = self.expand_with_adjust(
                    &header,
                    note_offset,
                    IfdLabel::MakerNote,
                    header.adjustment + adjust,
                    &mut guard,
                    &mut warnings,
                )? {
                    directories.push(node.dir);
                }
            }
        }

        // XMP packet hand-off, an opaque byte block from IFD0.
        if let Some(extractor) = self.xmp.as_deref() {
            let packet = directories
                .iter()
                .find(|d| d.label == IfdLabel::Ifd(0))
                .and_then(|d| d.get(Tag::XmpPacket.to_u16()))
                .and_then(packet_bytes);
            if let Some(packet) = packet {
                match extractor.extract(&packet) {
                    Ok(mapping) => xmp = mapping,
                    Err(message) => {
                        warn!(%message, "XMP extractor rejected the packet");
                        warnings.push(Warning::Xmp { message });
                    }
                }
            }
        }

        Ok(Metadata {
            header,
            directories,
            warnings,
            xmp,
        })
    }

    fn read_header(&mut self, warnings: &mut Vec<Warning>) -> ExifResult<TiffHeader> {
        let base = self.base_offset;

        let mut marker = [0u8; 2];
        self.source.read_at(base, &mut marker)?;
        let byte_order = match &marker {
            b"II" => ByteOrder::LittleEndian,
            b"MM" => ByteOrder::BigEndian,
            _ => return Err(ExifError::MalformedHeader("unrecognized byte-order marker")),
        };

        let mut reader = SourceReader::new(&mut self.source, byte_order);
        let magic = reader.read_u16_at(base + 2)?;
        if magic != TIFF_MAGIC {
            if self.mode == Mode::Strict {
                return Err(ExifError::MalformedHeader("magic is not 42"));
            }
            warn!(magic, "header magic is not 42, continuing leniently");
            warnings.push(Warning::BadMagic { value: magic });
        }

        let ifd0 = reader.read_u32_at(base + 4)?;
        Ok(TiffHeader {
            byte_order,
            base_offset: base,
            ifd0_offset: base + u64::from(ifd0),
            adjustment: self.adjustment,
        })
    }

    /// Decodes one directory: entry count, the 12-byte entries, and the
    /// trailing next-IFD pointer.
    fn read_directory(
        &mut self,
        header: &TiffHeader,
        offset: u64,
        label: IfdLabel,
        adjust: i64,
        warnings: &mut Vec<Warning>,
    ) -> ExifResult<DirectoryNode> {
        let mut reader = SourceReader::new(&mut self.source, header.byte_order);
        let count = reader.read_u16_at(offset)?;

        let mut entries = Vec::with_capacity(usize::from(count));
        let mut note_offset = None;
        for i in 0..u64::from(count) {
            let mut raw = [0u8; 12];
            reader.read_into(offset + 2 + 12 * i, &mut raw)?;
            let entry = Entry::from_bytes(raw, header.byte_order);

            if label == IfdLabel::Exif && entry.tag == Tag::MakerNote.to_u16() {
                note_offset = entry_indirect_offset(&entry, header, adjust);
            }

            match entry.decode(&mut reader, header.base_offset, adjust, &self.limits) {
                Ok(decoded) => {
                    if decoded.lossy_ascii {
                        warn!(ifd = %label, tag = entry.tag, "invalid text encoding repaired");
                        warnings.push(Warning::Encoding {
                            ifd: label,
                            tag: entry.tag,
                        });
                    }
                    entries.push((entry.tag, decoded.value));
                }
                Err(ExifError::Format(err)) if self.mode == Mode::Lenient => {
                    warn!(ifd = %label, tag = entry.tag, %err, "dropping undecodable entry");
                    warnings.push(Warning::from_format(label, &err));
                }
                Err(err) => return Err(err),
            }
        }

        // Files cut off right after their last entry are common; losing the
        // fully decoded directory over its trailing pointer would be wrong.
        let next = match reader.read_u32_at(offset + 2 + 12 * u64::from(count)) {
            Ok(next) => next,
            Err(ExifError::Format(err)) if self.mode == Mode::Lenient => {
                warn!(ifd = %label, %err, "next-IFD pointer unreadable, ending the chain");
                warnings.push(Warning::from_format(label, &err));
                0
            }
            Err(err) => return Err(err),
        };
        Ok(DirectoryNode {
            dir: ImageFileDirectory {
                offset,
                label,
                entries,
            },
            next,
            note_offset,
        })
    }

    /// A pointer-seeded, single-node walk into a sub-directory.
    fn expand(
        &mut self,
        header: &TiffHeader,
        offset: u64,
        label: IfdLabel,
        guard: &mut ChainGuard,
        warnings: &mut Vec<Warning>,
    ) -> ExifResult<Option<DirectoryNode>> {
        self.expand_with_adjust(header, offset, label, header.adjustment, guard, warnings)
    }

    fn expand_with_adjust(
        &mut self,
        header: &TiffHeader,
        offset: u64,
        label: IfdLabel,
        adjust: i64,
        guard: &mut ChainGuard,
        warnings: &mut Vec<Warning>,
    ) -> ExifResult<Option<DirectoryNode>> {
        if !guard.visit(offset) {
            warn!(offset, ifd = %label, "sub-directory pointer loops back, skipping");
            warnings.push(Warning::LoopDetected { offset });
            return Ok(None);
        }
        match self.read_directory(header, offset, label, adjust, warnings) {
            Ok(node) => Ok(Some(node)),
            Err(err) => {
                self.directory_failed(label, err, warnings)?;
                Ok(None)
            }
        }
    }

    /// Applies the mode policy to a directory-level failure: lenient parses
    /// keep everything decoded so far, strict parses and I/O failures abort.
    fn directory_failed(
        &self,
        label: IfdLabel,
        err: ExifError,
        warnings: &mut Vec<Warning>,
    ) -> ExifResult<()> {
        match err {
            ExifError::Format(err) if self.mode == Mode::Lenient => {
                warn!(ifd = %label, %err, "directory undecodable, keeping earlier results");
                warnings.push(Warning::from_format(label, &err));
                Ok(())
            }
            err => Err(err),
        }
    }
}

/// The raw value offset of an entry whose payload is indirected, rebased the
/// same way the entry decoder would.
fn entry_indirect_offset(entry: &Entry, header: &TiffHeader, adjust: i64) -> Option<u64> {
    entry
        .indirect_raw_offset(header.byte_order)
        .and_then(|raw| (header.base_offset + raw).checked_add_signed(adjust))
}

/// Rebases a raw block-relative offset the same way the entry decoder does.
fn resolve_offset(header: &TiffHeader, raw: u64) -> Option<u64> {
    (header.base_offset + raw).checked_add_signed(header.adjustment)
}

/// The absolute offset a sub-directory pointer tag aims at.
fn directory_pointer(dir: &ImageFileDirectory, tag: Tag, header: &TiffHeader) -> Option<u64> {
    let raw = dir.get(tag.to_u16()).and_then(Value::first_uint)?;
    resolve_offset(header, raw)
}

/// The raw bytes of an XMP packet. Writers emit the packet tag as either
/// UNDEFINED or BYTE; both carry the same byte block.
fn packet_bytes(value: &Value) -> Option<Cow<'_, [u8]>> {
    match value {
        Value::Undefined(v) => Some(Cow::Borrowed(v.as_slice())),
        Value::Unsigned(v) => v
            .iter()
            .map(|&n| u8::try_from(n).ok())
            .collect::<Option<Vec<u8>>>()
            .map(Cow::Owned),
        _ => None,
    }
}
