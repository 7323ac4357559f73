//! Ecliptic longitudes and the ascendant.
//!
//! [`LowPrecision`] uses mean Keplerian elements (JPL "Approximate
//! Positions of the Planets", 1800-2050 AD) for the planets, a truncated
//! lunar series for the Moon and the closed-form ascendant. Expect errors of
//! a fraction of a degree for the inner bodies and up to a few degrees for
//! Pluto; swap in a better [`Ephemeris`] if that matters.

use std::f64::consts::PI;

use serde::Serialize;

use crate::zodiac::normalize_degrees;

/// Julian day of the J2000.0 epoch.
const J2000: f64 = 2_451_545.0;

/// General precession in longitude, degrees per Julian century.
const PRECESSION_PER_CENTURY: f64 = 1.396_971;

/// Bodies reported by the planetary positions endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Body {
    pub const ALL: [Body; 10] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
        }
    }
}

/// Source of geocentric tropical positions.
pub trait Ephemeris: Send + Sync {
    /// Geocentric ecliptic longitude of `body`, degrees in `[0, 360)`.
    fn ecliptic_longitude(&self, body: Body, jd_ut: f64) -> f64;

    /// Ecliptic longitude of the ascendant for an observer at `latitude`
    /// and `longitude` (east positive), degrees in `[0, 360)`.
    fn ascendant(&self, jd_ut: f64, latitude: f64, longitude: f64) -> f64;
}

/// Bundled approximate ephemeris. No tables or data files.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowPrecision;

impl Ephemeris for LowPrecision {
    fn ecliptic_longitude(&self, body: Body, jd_ut: f64) -> f64 {
        let t = (jd_ut - J2000) / 36_525.0;
        match body {
            Body::Moon => moon_longitude(jd_ut - J2000),
            Body::Sun => {
                let earth = heliocentric(&EARTH, t);
                of_date(ecliptic_lon(-earth[0], -earth[1]), t)
            }
            planet => {
                let earth = heliocentric(&EARTH, t);
                let p = heliocentric(elements(planet), t);
                of_date(ecliptic_lon(p[0] - earth[0], p[1] - earth[1]), t)
            }
        }
    }

    fn ascendant(&self, jd_ut: f64, latitude: f64, longitude: f64) -> f64 {
        let d = jd_ut - J2000;
        let t = d / 36_525.0;
        let gmst = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t;
        let ramc = normalize_degrees(gmst + longitude);
        let obliquity = 23.439_291 - 0.013_004_2 * t;
        ascendant_from(ramc, obliquity, latitude)
    }
}

/// Ascendant from the right ascension of the midheaven, the obliquity of
/// the ecliptic and the geographic latitude, all in degrees.
pub(crate) fn ascendant_from(ramc: f64, obliquity: f64, latitude: f64) -> f64 {
    let (ramc, eps, phi) = (ramc.to_radians(), obliquity.to_radians(), latitude.to_radians());
    let y = ramc.cos();
    let x = -(ramc.sin() * eps.cos() + phi.tan() * eps.sin());
    normalize_degrees(y.atan2(x).to_degrees())
}

/// Orbital elements at J2000 with their rates per Julian century:
/// semi-major axis (au), eccentricity, inclination, mean longitude,
/// longitude of perihelion, longitude of ascending node (degrees).
struct Elements {
    at_epoch: [f64; 6],
    rate: [f64; 6],
}

const MERCURY: Elements = Elements {
    at_epoch: [0.387_099_27, 0.205_635_93, 7.004_979_02, 252.250_323_50, 77.457_796_28, 48.330_765_93],
    rate: [0.000_000_37, 0.000_019_06, -0.005_947_49, 149_472.674_111_75, 0.160_476_89, -0.125_340_81],
};
const VENUS: Elements = Elements {
    at_epoch: [0.723_335_66, 0.006_776_72, 3.394_676_05, 181.979_099_50, 131.602_467_18, 76.679_842_55],
    rate: [0.000_003_90, -0.000_041_07, -0.000_788_90, 58_517.815_387_29, 0.002_683_29, -0.277_694_18],
};
const EARTH: Elements = Elements {
    at_epoch: [1.000_002_61, 0.016_711_23, -0.000_015_31, 100.464_571_66, 102.937_681_93, 0.0],
    rate: [0.000_005_62, -0.000_043_92, -0.012_946_68, 35_999.372_449_81, 0.323_273_64, 0.0],
};
const MARS: Elements = Elements {
    at_epoch: [1.523_710_34, 0.093_394_10, 1.849_691_42, -4.553_432_05, -23.943_629_59, 49.559_538_91],
    rate: [0.000_018_47, 0.000_078_82, -0.008_131_31, 19_140.302_684_99, 0.444_410_88, -0.292_573_43],
};
const JUPITER: Elements = Elements {
    at_epoch: [5.202_887_00, 0.048_386_24, 1.304_396_95, 34.396_440_51, 14.728_479_83, 100.473_909_09],
    rate: [-0.000_116_07, -0.000_132_53, -0.001_837_14, 3_034.746_127_75, 0.212_526_68, 0.204_691_06],
};
const SATURN: Elements = Elements {
    at_epoch: [9.536_675_94, 0.053_861_79, 2.485_991_87, 49.954_244_23, 92.598_878_31, 113.662_424_48],
    rate: [-0.001_250_60, -0.000_509_91, 0.001_936_09, 1_222.493_622_01, -0.418_972_16, -0.288_677_94],
};
const URANUS: Elements = Elements {
    at_epoch: [19.189_164_64, 0.047_257_44, 0.772_637_83, 313.238_104_51, 170.954_276_30, 74.016_925_03],
    rate: [-0.001_961_76, -0.000_043_97, -0.002_429_39, 428.482_027_85, 0.408_052_81, 0.042_405_89],
};
const NEPTUNE: Elements = Elements {
    at_epoch: [30.069_922_76, 0.008_590_48, 1.770_043_47, -55.120_029_69, 44.964_762_27, 131.784_225_74],
    rate: [0.000_262_91, 0.000_051_05, 0.000_353_72, 218.459_453_25, -0.322_414_64, -0.005_086_64],
};
const PLUTO: Elements = Elements {
    at_epoch: [39.482_116_75, 0.248_827_30, 17.140_012_06, 238.929_038_33, 224.068_916_29, 110.303_936_84],
    rate: [-0.000_315_96, 0.000_051_70, 0.000_048_18, 145.207_805_15, -0.040_629_42, -0.011_834_82],
};

fn elements(body: Body) -> &'static Elements {
    match body {
        Body::Mercury => &MERCURY,
        Body::Venus => &VENUS,
        Body::Mars => &MARS,
        Body::Jupiter => &JUPITER,
        Body::Saturn => &SATURN,
        Body::Uranus => &URANUS,
        Body::Neptune => &NEPTUNE,
        Body::Pluto => &PLUTO,
        // Sun and Moon never reach the Keplerian path.
        Body::Sun | Body::Moon => &EARTH,
    }
}

/// Heliocentric ecliptic (J2000) rectangular coordinates, au.
fn heliocentric(el: &Elements, t: f64) -> [f64; 3] {
    let at = |i: usize| el.at_epoch[i] + el.rate[i] * t;
    let (a, e) = (at(0), at(1));
    let incl = at(2).to_radians();
    let mean_lon = at(3);
    let peri = at(4);
    let node = at(5);

    let omega = (peri - node).to_radians();
    let node = node.to_radians();
    let mean_anomaly = (normalize_degrees(mean_lon - peri + 180.0) - 180.0).to_radians();
    let ecc_anomaly = solve_kepler(mean_anomaly, e);

    let xp = a * (ecc_anomaly.cos() - e);
    let yp = a * (1.0 - e * e).sqrt() * ecc_anomaly.sin();

    let (sw, cw) = omega.sin_cos();
    let (sn, cn) = node.sin_cos();
    let (si, ci) = incl.sin_cos();
    [
        (cw * cn - sw * sn * ci) * xp + (-sw * cn - cw * sn * ci) * yp,
        (cw * sn + sw * cn * ci) * xp + (-sw * sn + cw * cn * ci) * yp,
        (sw * si) * xp + (cw * si) * yp,
    ]
}

/// Eccentric anomaly for mean anomaly `m` (radians) by Newton iteration.
fn solve_kepler(m: f64, e: f64) -> f64 {
    let mut ecc = m + e * m.sin();
    for _ in 0..20 {
        let delta = (ecc - e * ecc.sin() - m) / (1.0 - e * ecc.cos());
        ecc -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ecc
}

fn ecliptic_lon(x: f64, y: f64) -> f64 {
    normalize_degrees(y.atan2(x).to_degrees())
}

/// Shift a J2000 longitude to the equinox of date.
fn of_date(lon_j2000: f64, t: f64) -> f64 {
    normalize_degrees(lon_j2000 + PRECESSION_PER_CENTURY * t)
}

/// Geocentric lunar longitude of date, `d` days from J2000.
fn moon_longitude(d: f64) -> f64 {
    let rad = |deg: f64| normalize_degrees(deg) * PI / 180.0;
    let mean_lon = 218.316 + 13.176_396 * d;
    let moon_anomaly = rad(134.963 + 13.064_993 * d);
    let sun_anomaly = rad(357.529 + 0.985_600_28 * d);
    let elongation = rad(297.850 + 12.190_749 * d);
    let latitude_arg = rad(93.272 + 13.229_350 * d);

    normalize_degrees(
        mean_lon + 6.289 * moon_anomaly.sin() + 1.274 * (2.0 * elongation - moon_anomaly).sin()
            + 0.658 * (2.0 * elongation).sin()
            + 0.214 * (2.0 * moon_anomaly).sin()
            - 0.186 * sun_anomaly.sin()
            - 0.114 * (2.0 * latitude_arg).sin(),
    )
}
