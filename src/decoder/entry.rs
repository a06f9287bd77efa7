//! Decoding of single 12-byte directory entries.

use crate::error::{ExifFormatError, ExifResult};
use crate::tags::{IfdPointer, Type};
use crate::value::{Rational, Value};

use super::stream::{decode_int, decode_uint, ByteOrder, ByteSource, SourceReader};
use super::Limits;

/// A raw IFD entry.
///
/// An entry has four fields:
///
/// ```text
/// Tag    2 bytes
/// Type   2 bytes
/// Count  4 bytes
/// Value  4 bytes, either the value itself (left-justified) or an offset
/// ```
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) tag: u16,
    pub(crate) code: u16,
    pub(crate) count: u32,
    value_field: [u8; 4],
}

/// A decoded entry value plus repair notes the mode policy cares about.
#[derive(Debug)]
pub(crate) struct Decoded {
    pub(crate) value: Value,
    /// The ASCII payload held invalid UTF-8 and a lossy string was used.
    pub(crate) lossy_ascii: bool,
}

impl Entry {
    pub(crate) fn from_bytes(raw: [u8; 12], order: ByteOrder) -> Entry {
        Entry {
            tag: order.u16([raw[0], raw[1]]),
            code: order.u16([raw[2], raw[3]]),
            count: order.u32([raw[4], raw[5], raw[6], raw[7]]),
            value_field: [raw[8], raw[9], raw[10], raw[11]],
        }
    }

    /// Decodes the entry into a typed value.
    ///
    /// Values of up to 4 bytes live inline in the value field and are decoded
    /// without touching the source. Larger values are indirected: the value
    /// field holds a block-relative offset, rebased by `base` and `adjust`.
    pub(crate) fn decode<S: ByteSource + ?Sized>(
        &self,
        reader: &mut SourceReader<'_, S>,
        base: u64,
        adjust: i64,
        limits: &Limits,
    ) -> ExifResult<Decoded> {
        let type_ = Type::from_u16(self.code)
            .ok_or(ExifFormatError::UnknownFieldType(self.code, self.tag))?;

        let total = u64::from(self.count) * type_.size();
        if total > limits.ifd_value_size as u64 {
            return Err(ExifFormatError::ValueTooLarge(total).into());
        }

        let order = reader.order;
        if total <= 4 {
            return decode_elements(order, type_, &self.value_field[..total as usize]);
        }

        let raw = u64::from(order.u32(self.value_field));
        let offset = (base + raw)
            .checked_add_signed(adjust)
            .ok_or(ExifFormatError::TruncatedData(raw, total))?;
        let buf = reader.read_vec(offset, total as usize)?;
        decode_elements(order, type_, &buf)
    }

    /// The raw block-relative offset in the value field, when the payload is
    /// indirected rather than inline.
    pub(crate) fn indirect_raw_offset(&self, order: ByteOrder) -> Option<u64> {
        let type_ = Type::from_u16(self.code)?;
        let total = u64::from(self.count) * type_.size();
        (total > 4).then(|| u64::from(order.u32(self.value_field)))
    }
}

/// Decodes `data` as a run of elements of `type_`. The caller guarantees
/// `data.len()` is a multiple of the element size.
fn decode_elements(order: ByteOrder, type_: Type, data: &[u8]) -> ExifResult<Decoded> {
    let width = type_.size() as usize;
    let value = match type_ {
        Type::BYTE => Value::Unsigned(data.iter().map(|&b| u64::from(b)).collect()),
        Type::SBYTE => Value::Signed(data.iter().map(|&b| i64::from(b as i8)).collect()),
        Type::SHORT | Type::LONG => Value::Unsigned(
            data.chunks_exact(width)
                .map(|c| decode_uint(order, c))
                .collect::<ExifResult<_>>()?,
        ),
        Type::SSHORT | Type::SLONG => Value::Signed(
            data.chunks_exact(width)
                .map(|c| decode_int(order, c))
                .collect::<ExifResult<_>>()?,
        ),
        Type::FLOAT => Value::Float(
            data.chunks_exact(width)
                .map(|c| decode_uint(order, c).map(|bits| f32::from_bits(bits as u32)))
                .collect::<ExifResult<_>>()?,
        ),
        Type::DOUBLE => Value::Double(
            data.chunks_exact(width)
                .map(|c| decode_uint(order, c).map(f64::from_bits))
                .collect::<ExifResult<_>>()?,
        ),
        Type::RATIONAL => Value::Rational(decode_rationals(order, data, false)?),
        Type::SRATIONAL => Value::SRational(decode_rationals(order, data, true)?),
        Type::IFD => Value::Ifd(
            data.chunks_exact(width)
                .map(|c| decode_uint(order, c).map(IfdPointer))
                .collect::<ExifResult<_>>()?,
        ),
        Type::UNDEFINED => Value::Undefined(data.to_vec()),
        Type::ASCII => {
            // Anything after the first null byte is padding, not an error.
            let text = match data.iter().position(|&b| b == 0) {
                Some(null) => &data[..null],
                None => data,
            };
            return Ok(match std::str::from_utf8(text) {
                Ok(s) => Decoded {
                    value: Value::Ascii(s.to_owned()),
                    lossy_ascii: false,
                },
                Err(_) => Decoded {
                    value: Value::Ascii(String::from_utf8_lossy(text).into_owned()),
                    lossy_ascii: true,
                },
            });
        }
    };

    Ok(Decoded {
        value,
        lossy_ascii: false,
    })
}

/// Rationals consume 8 bytes per element: two 4-byte integers, numerator
/// first.
fn decode_rationals(order: ByteOrder, data: &[u8], signed: bool) -> ExifResult<Vec<Rational>> {
    data.chunks_exact(8)
        .map(|pair| {
            let num = if signed {
                decode_int(order, &pair[..4])?
            } else {
                decode_uint(order, &pair[..4])? as i64
            };
            let den = if signed {
                decode_int(order, &pair[4..])?
            } else {
                decode_uint(order, &pair[4..])? as i64
            };
            Ok(Rational::new(num, den))
        })
        .collect()
}
