//! Tag and field type dictionaries.

use std::fmt;

use crate::directory::IfdLabel;

macro_rules! tags {
    {
        $( #[$enum_attr:meta] )*
        $vis:vis enum $name:ident $(unknown($unknown:ident))? {
            $($(#[$ident_attr:meta])* $tag:ident = $val:expr,)*
        }
    } => {
        $( #[$enum_attr] )*
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
        #[non_exhaustive]
        #[repr(u16)]
        $vis enum $name {
            $($(#[$ident_attr])* $tag = $val,)*
            $(
                /// A tag id with no entry in the dictionary.
                $unknown(u16),
            )?
        }

        impl $name {
            #[inline(always)]
            pub const fn from_u16(val: u16) -> Option<Self> {
                match val {
                    $( $val => Some($name::$tag), )*
                    _ => None,
                }
            }

            $(
            /// Maps every id to a tag; unregistered ids become placeholders.
            #[inline(always)]
            pub const fn from_u16_exhaustive(val: u16) -> Self {
                match Self::from_u16(val) {
                    Some(tag) => tag,
                    None => $name::$unknown(val),
                }
            }
            )?

            #[inline(always)]
            pub const fn to_u16(&self) -> u16 {
                match *self {
                    $( $name::$tag => $val, )*
                    $( $name::$unknown(other) => other, )?
                }
            }
        }
    };
}

tags! {
/// Baseline TIFF and EXIF tags found in IFD0/IFD1 and the Exif IFD.
pub enum Tag unknown(Unknown) {
    ImageWidth = 256,
    ImageLength = 257,
    BitsPerSample = 258,
    Compression = 259,
    PhotometricInterpretation = 262,
    ImageDescription = 270,
    Make = 271,
    Model = 272,
    StripOffsets = 273,
    Orientation = 274,
    SamplesPerPixel = 277,
    RowsPerStrip = 278,
    StripByteCounts = 279,
    XResolution = 282,
    YResolution = 283,
    PlanarConfiguration = 284,
    ResolutionUnit = 296,
    Software = 305,
    DateTime = 306,
    Artist = 315,
    HostComputer = 316,
    // Adobe XMP packet, stored as an opaque byte block.
    XmpPacket = 700,
    Copyright = 33432,
    ExposureTime = 0x829A,
    FNumber = 0x829D,
    // Pointers to the EXIF-private sub-directories.
    ExifDirectory = 0x8769,
    GpsDirectory = 0x8825,
    IsoSpeedRatings = 0x8827,
    ExifVersion = 0x9000,
    DateTimeOriginal = 0x9003,
    DateTimeDigitized = 0x9004,
    ShutterSpeedValue = 0x9201,
    ApertureValue = 0x9202,
    BrightnessValue = 0x9203,
    ExposureBiasValue = 0x9204,
    MaxApertureValue = 0x9205,
    SubjectDistance = 0x9206,
    MeteringMode = 0x9207,
    LightSource = 0x9208,
    Flash = 0x9209,
    FocalLength = 0x920A,
    MakerNote = 0x927C,
    UserComment = 0x9286,
    ColorSpace = 0xA001,
    PixelXDimension = 0xA002,
    PixelYDimension = 0xA003,
    InteropDirectory = 0xA005,
    FocalLengthIn35mmFilm = 0xA405,
    LensMake = 0xA433,
    LensModel = 0xA434,
}
}

tags! {
/// Tags of the GPS sub-directory. The id space is private to that directory.
pub enum GpsTag unknown(Unknown) {
    GPSVersionID = 0,
    GPSLatitudeRef = 1,
    GPSLatitude = 2,
    GPSLongitudeRef = 3,
    GPSLongitude = 4,
    GPSAltitudeRef = 5,
    GPSAltitude = 6,
    GPSTimeStamp = 7,
    GPSSatellites = 8,
    GPSStatus = 9,
    GPSMeasureMode = 10,
    GPSDOP = 11,
    GPSSpeedRef = 12,
    GPSSpeed = 13,
    GPSTrackRef = 14,
    GPSTrack = 15,
    GPSImgDirectionRef = 16,
    GPSImgDirection = 17,
    GPSMapDatum = 18,
    GPSDate = 29,
}
}

tags! {
/// The field type of an IFD entry (a 2-byte code).
///
/// Codes 1 through 13 are registered; code 0 and codes above 13 are invalid
/// and handled according to the operating mode.
pub enum Type {
    /// 8-bit unsigned integer
    BYTE = 1,
    /// 8-bit byte containing 7-bit ASCII; null-terminated
    ASCII = 2,
    /// 16-bit unsigned integer
    SHORT = 3,
    /// 32-bit unsigned integer
    LONG = 4,
    /// Fraction stored as two 32-bit unsigned integers
    RATIONAL = 5,
    /// 8-bit signed integer
    SBYTE = 6,
    /// 8-bit byte that may contain anything
    UNDEFINED = 7,
    /// 16-bit signed integer
    SSHORT = 8,
    /// 32-bit signed integer
    SLONG = 9,
    /// Fraction stored as two 32-bit signed integers
    SRATIONAL = 10,
    /// 32-bit IEEE floating point
    FLOAT = 11,
    /// 64-bit IEEE floating point
    DOUBLE = 12,
    /// 32-bit unsigned integer holding the offset of a sub-IFD
    IFD = 13,
}
}

impl Type {
    /// Byte width of a single element of this type.
    #[inline(always)]
    pub const fn size(self) -> u64 {
        match self {
            Type::BYTE | Type::SBYTE | Type::ASCII | Type::UNDEFINED => 1,
            Type::SHORT | Type::SSHORT => 2,
            Type::LONG | Type::SLONG | Type::FLOAT | Type::IFD => 4,
            Type::RATIONAL | Type::SRATIONAL | Type::DOUBLE => 8,
        }
    }

    #[inline(always)]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Type::SBYTE | Type::SSHORT | Type::SLONG | Type::SRATIONAL
        )
    }
}

/// Identifies the offset of an IFD.
///
/// The semantics of treating `0` as an end-of-chain marker are imposed by
/// the IFD walker, not by this type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct IfdPointer(pub u64);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Tag::Unknown(n) => write!(f, "Tag(0x{n:04X})"),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl fmt::Display for GpsTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GpsTag::Unknown(n) => write!(f, "GpsTag(0x{n:04X})"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// Resolves the display name of a tag id within a directory.
///
/// The GPS directory has its own id space; every other directory shares the
/// TIFF/EXIF dictionary. Unknown ids yield a placeholder, never `None`.
pub fn tag_name(label: IfdLabel, id: u16) -> String {
    match label {
        IfdLabel::Gps => GpsTag::from_u16_exhaustive(id).to_string(),
        _ => Tag::from_u16_exhaustive(id).to_string(),
    }
}
