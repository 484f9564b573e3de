//! Inertial to Earth-fixed frame rotation
//!
//! SGP4 reports positions in an Earth-centered inertial frame (TEME). To
//! compare them with an observer on the ground they are rotated about the
//! polar axis by the Greenwich Mean Sidereal Time angle. Polar motion,
//! nutation and the equation of the equinoxes are ignored, which keeps the
//! result good to the kilometer level and no better.

use chrono::{DateTime, Utc};
use nalgebra::{Matrix3, Vector3};

use crate::constants::JULIAN_CENTURY_DAYS;
use crate::time::JulianDate;

/// Greenwich Mean Sidereal Time in degrees, normalized into `[0, 360)`.
///
/// IAU 1982 expression in terms of days and Julian centuries since J2000.0.
pub fn gmst_degrees(jd: &JulianDate) -> f64 {
    let d = jd.days_since_j2000();
    let t = d / JULIAN_CENTURY_DAYS;
    let gmst = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    gmst.rem_euclid(360.0)
}

/// Greenwich Mean Sidereal Time in radians, in `[0, 2π)`.
pub fn gmst_radians(jd: &JulianDate) -> f64 {
    gmst_degrees(jd).to_radians()
}

/// Rotation matrix about the Z axis
fn rot_z(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Rotate an inertial vector into the Earth-fixed frame by a sidereal angle.
pub fn rotate_eci_to_ecef(pos_eci: &Vector3<f64>, gmst_rad: f64) -> Vector3<f64> {
    rot_z(gmst_rad) * pos_eci
}

/// Earth-fixed position (km) of an inertial position (km) at `instant`.
pub fn eci_to_ecef(pos_eci_km: &Vector3<f64>, instant: &DateTime<Utc>) -> Vector3<f64> {
    eci_to_ecef_jd(pos_eci_km, &JulianDate::from_utc(instant))
}

/// As [`eci_to_ecef`], for an instant already expressed as a Julian date.
pub fn eci_to_ecef_jd(pos_eci_km: &Vector3<f64>, jd: &JulianDate) -> Vector3<f64> {
    rotate_eci_to_ecef(pos_eci_km, gmst_radians(jd))
}
