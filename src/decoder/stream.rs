//! All IO functionality needed for metadata decoding.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{ExifError, ExifFormatError, ExifResult};

/// Byte order of the TIFF block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// little endian byte order ("II")
    LittleEndian,
    /// big endian byte order ("MM")
    BigEndian,
}

macro_rules! decode_fn {
    ($name:ident, $type:ty) => {
        /// decodes a $type from a fixed-width window
        #[inline(always)]
        pub(crate) fn $name(self, window: [u8; std::mem::size_of::<$type>()]) -> $type {
            match self {
                ByteOrder::LittleEndian => <$type>::from_le_bytes(window),
                ByteOrder::BigEndian => <$type>::from_be_bytes(window),
            }
        }
    };
}

impl ByteOrder {
    decode_fn!(u16, u16);
    decode_fn!(u32, u32);
    decode_fn!(u64, u64);
}

/// Decodes a 1/2/4/8-byte window into an unsigned integer, widened to 64
/// bits. The window length selects the source width.
pub(crate) fn decode_uint(order: ByteOrder, window: &[u8]) -> ExifResult<u64> {
    Ok(match *window {
        [a] => u64::from(a),
        [a, b] => u64::from(order.u16([a, b])),
        [a, b, c, d] => u64::from(order.u32([a, b, c, d])),
        [a, b, c, d, e, f, g, h] => order.u64([a, b, c, d, e, f, g, h]),
        _ => {
            return Err(ExifFormatError::TruncatedData(0, window.len() as u64).into());
        }
    })
}

/// Signed counterpart of [`decode_uint`]: sign-extends the source width
/// into an `i64`.
pub(crate) fn decode_int(order: ByteOrder, window: &[u8]) -> ExifResult<i64> {
    Ok(match *window {
        [a] => i64::from(a as i8),
        [a, b] => i64::from(order.u16([a, b]) as i16),
        [a, b, c, d] => i64::from(order.u32([a, b, c, d]) as i32),
        [a, b, c, d, e, f, g, h] => order.u64([a, b, c, d, e, f, g, h]) as i64,
        _ => {
            return Err(ExifFormatError::TruncatedData(0, window.len() as u64).into());
        }
    })
}

/// A seekable, randomly-readable byte provider backing a parse.
///
/// The decoder only borrows a source for the duration of a parse and never
/// writes. Any `Read + Seek` type implements this; callers with remote or
/// mapped storage can implement it directly.
pub trait ByteSource {
    /// Read exactly `buf.len()` bytes starting at `offset`.
    ///
    /// A short read or seek failure is an [`ExifError::Io`].
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ExifResult<()>;
}

impl<R: Read + Seek> ByteSource for R {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ExifResult<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)?;
        Ok(())
    }
}

/// Byte-order-aware view over a [`ByteSource`] for one parse.
///
/// Reads that run off the end of the source surface as
/// [`ExifFormatError::TruncatedData`] so the mode policy can decide their
/// fate; genuine I/O failures stay fatal.
pub(crate) struct SourceReader<'a, S: ?Sized> {
    source: &'a mut S,
    pub(crate) order: ByteOrder,
}

impl<'a, S: ByteSource + ?Sized> SourceReader<'a, S> {
    pub(crate) fn new(source: &'a mut S, order: ByteOrder) -> Self {
        SourceReader { source, order }
    }

    pub(crate) fn read_into(&mut self, offset: u64, buf: &mut [u8]) -> ExifResult<()> {
        match self.source.read_at(offset, buf) {
            Err(ExifError::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                Err(ExifFormatError::TruncatedData(offset, buf.len() as u64).into())
            }
            other => other,
        }
    }

    pub(crate) fn read_vec(&mut self, offset: u64, len: usize) -> ExifResult<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    pub(crate) fn read_u16_at(&mut self, offset: u64) -> ExifResult<u16> {
        let mut window = [0; 2];
        self.read_into(offset, &mut window)?;
        Ok(self.order.u16(window))
    }

    pub(crate) fn read_u32_at(&mut self, offset: u64) -> ExifResult<u32> {
        let mut window = [0; 4];
        self.read_into(offset, &mut window)?;
        Ok(self.order.u32(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn widened_unsigned_decoding() {
        assert_eq!(decode_uint(ByteOrder::LittleEndian, &[0x2A]).unwrap(), 42);
        assert_eq!(
            decode_uint(ByteOrder::LittleEndian, &[0x34, 0x12]).unwrap(),
            0x1234
        );
        assert_eq!(
            decode_uint(ByteOrder::BigEndian, &[0x12, 0x34]).unwrap(),
            0x1234
        );
        assert_eq!(
            decode_uint(ByteOrder::BigEndian, &[0, 0, 0x10, 0]).unwrap(),
            0x1000
        );
    }

    #[test]
    fn sign_extension() {
        assert_eq!(decode_int(ByteOrder::LittleEndian, &[0xFF]).unwrap(), -1);
        assert_eq!(
            decode_int(ByteOrder::BigEndian, &[0xFF, 0xFE]).unwrap(),
            -2
        );
        assert_eq!(
            decode_int(ByteOrder::LittleEndian, &[0xFC, 0xFF, 0xFF, 0xFF]).unwrap(),
            -4
        );
    }

    #[test]
    fn unsupported_width_is_rejected() {
        assert!(decode_uint(ByteOrder::LittleEndian, &[0, 1, 2]).is_err());
    }

    #[test]
    fn short_source_reads_become_truncations() {
        let mut data = Cursor::new(vec![1u8, 2, 3]);
        let mut reader = SourceReader::new(&mut data, ByteOrder::LittleEndian);
        let err = reader.read_vec(2, 4).unwrap_err();
        assert!(matches!(
            err,
            ExifError::Format(ExifFormatError::TruncatedData(2, 4))
        ));
    }
}
