//! Response-level calculations: positions of all bodies and the ascendant.

use serde::Serialize;
use time::OffsetDateTime;

use crate::datetime::julian_day;
use crate::ephemeris::{Body, Ephemeris};
use crate::error::AstroError;
use crate::zodiac::{zodiac_sign, Sign};

/// Position of one body, degrees within its sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanetPosition {
    #[serde(skip)]
    pub body: Body,
    pub sign: Sign,
    pub degrees: f64,
}

/// Ascendant for a moment and place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AscendantReport {
    pub sign: Sign,
    /// Degrees within `sign`, rounded.
    pub degrees: f64,
    /// Unrounded ecliptic longitude of the ascendant.
    pub longitude: f64,
    pub at_utc: OffsetDateTime,
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Sign and degrees of every [`Body`] at `at`, in [`Body::ALL`] order.
pub fn planetary_positions(
    ephemeris: &dyn Ephemeris,
    at: OffsetDateTime,
    decimals: u32,
) -> Vec<PlanetPosition> {
    let jd = julian_day(at);
    Body::ALL
        .iter()
        .map(|&body| {
            let (sign, degrees) = zodiac_sign(ephemeris.ecliptic_longitude(body, jd));
            PlanetPosition {
                body,
                sign,
                degrees: round_to(degrees, decimals),
            }
        })
        .collect()
}

/// Ascendant at `at` for the given coordinates.
///
/// Latitude must lie in `[-90, 90]` and longitude in `[-180, 180]`.
pub fn ascendant(
    ephemeris: &dyn Ephemeris,
    at: OffsetDateTime,
    latitude: f64,
    longitude: f64,
    decimals: u32,
) -> Result<AscendantReport, AstroError> {
    check_range("latitude", latitude, 90.0)?;
    check_range("longitude", longitude, 180.0)?;

    let lon = ephemeris.ascendant(julian_day(at), latitude, longitude);
    let (sign, degrees) = zodiac_sign(lon);
    Ok(AscendantReport {
        sign,
        degrees: round_to(degrees, decimals),
        longitude: lon,
        at_utc: at,
    })
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<(), AstroError> {
    if (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(AstroError::OutOfRange {
            field,
            value,
            min: -limit,
            max: limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    /// Every body at a fixed longitude; ascendant echoes the latitude.
    struct Fixed(f64);

    impl Ephemeris for Fixed {
        fn ecliptic_longitude(&self, _body: Body, _jd_ut: f64) -> f64 {
            self.0
        }

        fn ascendant(&self, _jd_ut: f64, latitude: f64, _longitude: f64) -> f64 {
            latitude + 180.0
        }
    }

    #[test]
    fn positions_cover_all_bodies_in_order() {
        let positions = planetary_positions(&Fixed(45.123_456), datetime!(2024-01-01 0:00 UTC), 4);
        let bodies: Vec<Body> = positions.iter().map(|p| p.body).collect();
        assert_eq!(bodies, Body::ALL.to_vec());
        for p in &positions {
            assert_eq!(p.sign, Sign::Taurus);
            assert_eq!(p.degrees, 15.1235);
        }
    }

    #[test]
    fn rounding_precision_is_configurable() {
        let positions = planetary_positions(&Fixed(45.126), datetime!(2024-01-01 0:00 UTC), 2);
        assert_eq!(positions[0].degrees, 15.13);
    }

    #[test]
    fn position_serializes_without_body() {
        let position = PlanetPosition {
            body: Body::Mars,
            sign: Sign::Leo,
            degrees: 1.5,
        };
        let json = serde_json::to_value(position).unwrap();
        assert_eq!(json, serde_json::json!({"sign": "Leo", "degrees": 1.5}));
    }

    #[test]
    fn ascendant_reports_sign_and_raw_longitude() {
        let report = ascendant(&Fixed(0.0), datetime!(2024-01-01 0:00 UTC), 10.5, 0.0, 4).unwrap();
        assert_eq!(report.sign, Sign::Libra);
        assert_eq!(report.degrees, 10.5);
        assert_eq!(report.longitude, 190.5);
    }

    #[test]
    fn coordinates_are_range_checked() {
        let at = datetime!(2024-01-01 0:00 UTC);
        let err = ascendant(&Fixed(0.0), at, 91.0, 0.0, 4).unwrap_err();
        assert!(matches!(err, AstroError::OutOfRange { field: "latitude", .. }));
        let err = ascendant(&Fixed(0.0), at, 0.0, -180.5, 4).unwrap_err();
        assert!(matches!(err, AstroError::OutOfRange { field: "longitude", .. }));
        assert!(ascendant(&Fixed(0.0), at, -90.0, 180.0, 4).is_ok());
    }
}
