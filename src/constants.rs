//! Physical and calendar constants shared across the crate

/// J2000.0 epoch as a Julian date
pub const J2000: f64 = 2_451_545.0;

/// Seconds per day
pub const DAY_S: f64 = 86_400.0;

/// Minutes per day
pub const DAY_MIN: f64 = 1_440.0;

/// Days per Julian century
pub const JULIAN_CENTURY_DAYS: f64 = 36_525.0;

/// WGS84 equatorial radius in kilometers
pub const WGS84_RADIUS_KM: f64 = 6_378.137;

/// WGS84 inverse flattening
pub const WGS84_INVERSE_FLATTENING: f64 = 298.257_223_563;

/// Earth radius used by SGP4 to flag a decayed orbit (WGS72, km)
pub const SGP4_EARTH_RADIUS_KM: f64 = 6_378.135;
