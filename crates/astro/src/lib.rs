//! lilit-astro: the calculation side of the LILIT astrological API.
//!
//! - [`zodiac_sign()`] -- ecliptic longitude to sign and degrees within sign
//! - [`parse_tz_offset()`] / [`parse_date_time()`] -- request input parsing
//! - [`Ephemeris`] -- longitude and ascendant source, with the bundled
//!   [`LowPrecision`] implementation
//! - [`planetary_positions()`] / [`ascendant()`] -- what the HTTP handlers call

pub mod chart;
pub mod datetime;
pub mod ephemeris;
pub mod error;
pub mod zodiac;

pub use chart::{ascendant, planetary_positions, round_to, AscendantReport, PlanetPosition};
pub use datetime::{julian_day, parse_date_time, parse_tz_offset, DateTimeInput};
pub use ephemeris::{Body, Ephemeris, LowPrecision};
pub use error::AstroError;
pub use zodiac::{zodiac_sign, Sign};
