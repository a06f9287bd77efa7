//! Decoded tag values.

use std::fmt;

use crate::tags::IfdPointer;

/// A fraction of two integers, as stored by RATIONAL and SRATIONAL fields.
///
/// A zero denominator is representable: real files contain such values and
/// they must not abort a parse. [`Rational::decimal`] reports them as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    pub const fn new(num: i64, den: i64) -> Rational {
        Rational { num, den }
    }

    /// Decimal value of the fraction; NaN when the denominator is zero.
    pub fn decimal(self) -> f64 {
        if self.den == 0 {
            f64::NAN
        } else {
            self.num as f64 / self.den as f64
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// The decoded value of one directory entry.
///
/// Integer kinds are widened to 64 bits regardless of their on-disk width;
/// the variant keeps the signedness of the field type. Array lengths equal
/// the entry's declared count, except for [`Value::Ascii`] where the raw
/// byte run is truncated at the first null.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    Unsigned(Vec<u64>),
    Signed(Vec<i64>),
    Ascii(String),
    Rational(Vec<Rational>),
    SRational(Vec<Rational>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Undefined(Vec<u8>),
    Ifd(Vec<IfdPointer>),
}

impl Value {
    /// Number of decoded elements.
    pub fn count(&self) -> usize {
        match self {
            Value::Unsigned(v) => v.len(),
            Value::Signed(v) => v.len(),
            Value::Ascii(s) => s.len(),
            Value::Rational(v) | Value::SRational(v) => v.len(),
            Value::Float(v) => v.len(),
            Value::Double(v) => v.len(),
            Value::Undefined(v) => v.len(),
            Value::Ifd(v) => v.len(),
        }
    }

    /// The decoded text of an ASCII field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Ascii(s) => Some(s),
            _ => None,
        }
    }

    /// The first element interpreted as an unsigned integer, if there is one.
    /// Used to follow sub-IFD pointer tags, which vendors store as LONG or IFD.
    pub fn first_uint(&self) -> Option<u64> {
        match self {
            Value::Unsigned(v) => v.first().copied(),
            Value::Ifd(v) => v.first().map(|p| p.0),
            Value::Signed(v) => v.first().and_then(|&n| u64::try_from(n).ok()),
            _ => None,
        }
    }

    /// The rational elements of a RATIONAL or SRATIONAL field.
    pub fn rationals(&self) -> Option<&[Rational]> {
        match self {
            Value::Rational(v) | Value::SRational(v) => Some(v),
            _ => None,
        }
    }

    /// The raw payload of an UNDEFINED field.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Undefined(v) => Some(v),
            _ => None,
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => join(f, v),
            Value::Signed(v) => join(f, v),
            Value::Ascii(s) => write!(f, "{s}"),
            Value::Rational(v) | Value::SRational(v) => join(f, v),
            Value::Float(v) => join(f, v),
            Value::Double(v) => join(f, v),
            Value::Undefined(v) => write!(f, "[{} bytes]", v.len()),
            Value::Ifd(v) => {
                for (i, p) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "IFD offset: {}", p.0)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_is_nan_not_an_error() {
        let r = Rational::new(7, 0);
        assert!(r.decimal().is_nan());
        assert_eq!(r.to_string(), "7/0");
    }

    #[test]
    fn decimal_division() {
        assert_eq!(Rational::new(1, 2).decimal(), 0.5);
        assert_eq!(Rational::new(-3, 2).decimal(), -1.5);
    }

    #[test]
    fn display_joins_elements() {
        let v = Value::Unsigned(vec![1, 2, 3]);
        assert_eq!(v.to_string(), "1, 2, 3");
        let r = Value::Rational(vec![Rational::new(1, 3)]);
        assert_eq!(r.to_string(), "1/3");
    }

    #[test]
    fn first_uint_follows_pointers() {
        assert_eq!(Value::Unsigned(vec![8]).first_uint(), Some(8));
        assert_eq!(Value::Ifd(vec![IfdPointer(0x20)]).first_uint(), Some(0x20));
        assert_eq!(Value::Signed(vec![-1]).first_uint(), None);
        assert_eq!(Value::Ascii("x".into()).first_uint(), None);
    }
}
