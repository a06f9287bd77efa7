//! Derivation of decimal coordinates from GPS directory fields.

use crate::directory::{IfdLabel, Metadata};
use crate::tags::GpsTag;
use crate::value::{Rational, Value};

/// Converts a degrees/minutes/seconds triple into signed decimal degrees.
///
/// `reference` is the hemisphere letter from the companion Ref tag; `'S'`
/// and `'W'` negate the result. A zero denominator in any component makes
/// the result NaN rather than a panic or an error.
pub fn dms_to_decimal(deg: Rational, min: Rational, sec: Rational, reference: char) -> f64 {
    let magnitude = deg.decimal() + min.decimal() / 60.0 + sec.decimal() / 3600.0;
    match reference {
        'S' | 'W' => -magnitude,
        _ => magnitude,
    }
}

impl Metadata {
    /// The decimal (latitude, longitude) pair derived from the GPS
    /// directory, when all four source tags are present and well-formed.
    pub fn gps_coords(&self) -> Option<(f64, f64)> {
        let gps = self.directory(IfdLabel::Gps)?;
        let lat = coordinate(gps.get(GpsTag::GPSLatitude.to_u16())?)?;
        let lat_ref = reference(gps.get(GpsTag::GPSLatitudeRef.to_u16())?)?;
        let lon = coordinate(gps.get(GpsTag::GPSLongitude.to_u16())?)?;
        let lon_ref = reference(gps.get(GpsTag::GPSLongitudeRef.to_u16())?)?;
        Some((
            dms_to_decimal(lat[0], lat[1], lat[2], lat_ref),
            dms_to_decimal(lon[0], lon[1], lon[2], lon_ref),
        ))
    }
}

fn coordinate(value: &Value) -> Option<[Rational; 3]> {
    match value.rationals()? {
        &[deg, min, sec, ..] => Some([deg, min, sec]),
        _ => None,
    }
}

fn reference(value: &Value) -> Option<char> {
    value.as_str()?.chars().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn southern_hemisphere_negates() {
        let d = dms_to_decimal(
            Rational::new(10, 1),
            Rational::new(30, 1),
            Rational::new(0, 1),
            'S',
        );
        assert_eq!(d, -10.5);
    }

    #[test]
    fn east_is_positive() {
        let d = dms_to_decimal(
            Rational::new(139, 1),
            Rational::new(41, 1),
            Rational::new(30, 1),
            'E',
        );
        assert!((d - 139.691_666).abs() < 1e-4);
    }

    #[test]
    fn all_zero_components() {
        let zero = Rational::new(0, 1);
        assert_eq!(dms_to_decimal(zero, zero, zero, 'N'), 0.0);
    }

    #[test]
    fn zero_denominator_propagates_nan() {
        let d = dms_to_decimal(
            Rational::new(10, 1),
            Rational::new(1, 0),
            Rational::new(0, 1),
            'N',
        );
        assert!(d.is_nan());
    }
}
