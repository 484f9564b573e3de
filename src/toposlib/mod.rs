//! Geographic observer positions on Earth
//!
//! Converts geodetic latitude/longitude/altitude to Earth-fixed (ECEF)
//! Cartesian coordinates on an ellipsoid, the inverse transform, and the
//! local horizon look angles from an observer toward an Earth-fixed target.
//!
//! # Example
//!
//! ```ignore
//! use nearsat::toposlib::WGS84;
//!
//! let toronto = WGS84.latlon(43.6625, -79.3950, 100.0);
//! println!("{} -> {:?} km", toronto, toronto.ecef_km);
//! ```

use nalgebra::Vector3;
use serde::Serialize;
use std::f64::consts::PI;

use crate::constants::{WGS84_INVERSE_FLATTENING, WGS84_RADIUS_KM};

/// An Earth ellipsoid model used for geodetic-to-geocentric conversion.
#[derive(Debug, Clone)]
pub struct Geoid {
    /// Name of the geoid model
    pub name: &'static str,
    /// Equatorial radius in kilometers
    pub radius_km: f64,
    /// Inverse flattening (a / (a - b))
    pub inverse_flattening: f64,
    /// (1 - f)^2, precomputed
    one_minus_flattening_squared: f64,
}

impl Geoid {
    /// Create a new geoid model.
    pub const fn new(name: &'static str, radius_km: f64, inverse_flattening: f64) -> Self {
        let f = 1.0 / inverse_flattening;
        let omf = 1.0 - f;
        Geoid {
            name,
            radius_km,
            inverse_flattening,
            one_minus_flattening_squared: omf * omf,
        }
    }

    /// First eccentricity squared, f(2 - f)
    pub fn eccentricity_squared(&self) -> f64 {
        1.0 - self.one_minus_flattening_squared
    }

    /// Create an observer position on this ellipsoid.
    ///
    /// # Arguments
    /// * `latitude_degrees` - Geodetic latitude in degrees (positive north)
    /// * `longitude_degrees` - Geodetic longitude in degrees (positive east)
    /// * `altitude_m` - Height above ellipsoid in meters
    pub fn latlon(
        &self,
        latitude_degrees: f64,
        longitude_degrees: f64,
        altitude_m: f64,
    ) -> ObserverPosition {
        ObserverPosition {
            latitude_deg: latitude_degrees,
            longitude_deg: longitude_degrees,
            altitude_m,
            ecef_km: self.to_ecef(latitude_degrees, longitude_degrees, altitude_m),
        }
    }

    /// Closed-form geodetic to ECEF conversion, result in km.
    pub fn to_ecef(&self, latitude_degrees: f64, longitude_degrees: f64, altitude_m: f64) -> Vector3<f64> {
        let lat = latitude_degrees * PI / 180.0;
        let lon = longitude_degrees * PI / 180.0;

        let sinphi = lat.sin();
        let cosphi = lat.cos();

        // Radius of curvature in the prime vertical, in units of the equatorial radius
        let c =
            1.0 / (cosphi * cosphi + sinphi * sinphi * self.one_minus_flattening_squared).sqrt();
        let s = self.one_minus_flattening_squared * c;

        let altitude_km = altitude_m / 1000.0;

        let xy = (self.radius_km * c + altitude_km) * cosphi;
        let x = xy * lon.cos();
        let y = xy * lon.sin();
        let z = (self.radius_km * s + altitude_km) * sinphi;

        Vector3::new(x, y, z)
    }

    /// Geodetic coordinates of an ECEF point.
    ///
    /// Returns `(latitude_degrees, longitude_degrees, altitude_m)`. Latitude
    /// is refined by fixed-point iteration, which converges to well below a
    /// millimeter for points near the surface.
    pub fn subpoint(&self, ecef_km: &Vector3<f64>) -> (f64, f64, f64) {
        let (x, y, z) = (ecef_km.x, ecef_km.y, ecef_km.z);
        let a = self.radius_km;
        let e2 = self.eccentricity_squared();

        let r = (x * x + y * y).sqrt();
        let lon = y.atan2(x);

        let mut lat = z.atan2(r);
        let mut c = 1.0;
        for _ in 0..6 {
            let sin_lat = lat.sin();
            c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            lat = (z + a * c * e2 * sin_lat).atan2(r);
        }

        let altitude_km = if lat.cos().abs() > 1e-12 {
            r / lat.cos() - a * c
        } else {
            // Along the polar axis r/cos(lat) is degenerate
            z.abs() - a * c * self.one_minus_flattening_squared
        };

        (lat.to_degrees(), lon.to_degrees(), altitude_km * 1000.0)
    }
}

/// WGS84 ellipsoid (GPS standard)
pub const WGS84: Geoid = Geoid::new("WGS84", WGS84_RADIUS_KM, WGS84_INVERSE_FLATTENING);

/// Geodetic to ECEF (km) on the WGS84 ellipsoid.
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Vector3<f64> {
    WGS84.to_ecef(lat_deg, lon_deg, alt_m)
}

/// ECEF (km) to geodetic `(lat_deg, lon_deg, alt_m)` on the WGS84 ellipsoid.
pub fn ecef_to_geodetic(ecef_km: &Vector3<f64>) -> (f64, f64, f64) {
    WGS84.subpoint(ecef_km)
}

/// An observer on the Earth's surface, supplied per query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObserverPosition {
    /// Geodetic latitude in degrees
    pub latitude_deg: f64,
    /// Geodetic longitude in degrees
    pub longitude_deg: f64,
    /// Height above the ellipsoid in meters
    pub altitude_m: f64,
    /// Earth-fixed position in km
    pub ecef_km: Vector3<f64>,
}

/// Direction and distance from an observer toward a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookAngles {
    /// Degrees clockwise from north (0=N, 90=E, 180=S, 270=W)
    pub azimuth_deg: f64,
    /// Degrees above the local horizon (negative below)
    pub elevation_deg: f64,
    /// Straight-line distance in km
    pub range_km: f64,
}

impl ObserverPosition {
    /// Observer on the WGS84 ellipsoid.
    pub fn wgs84(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        WGS84.latlon(lat_deg, lon_deg, alt_m)
    }

    /// Euclidean distance in km to an Earth-fixed point.
    pub fn distance_km(&self, target_ecef_km: &Vector3<f64>) -> f64 {
        (target_ecef_km - self.ecef_km).norm()
    }

    /// Azimuth, elevation and range toward an Earth-fixed target.
    pub fn look_angles(&self, target_ecef_km: &Vector3<f64>) -> LookAngles {
        let diff = target_ecef_km - self.ecef_km;
        let (elevation, azimuth) = self.ecef_to_horizon(&diff);
        LookAngles {
            azimuth_deg: azimuth * 180.0 / PI,
            elevation_deg: elevation * 180.0 / PI,
            range_km: diff.norm(),
        }
    }

    /// Rotate an ECEF direction vector into local horizon coordinates.
    ///
    /// Returns (elevation_radians, azimuth_radians).
    fn ecef_to_horizon(&self, direction: &Vector3<f64>) -> (f64, f64) {
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians();
        let slat = lat.sin();
        let clat = lat.cos();
        let slon = lon.sin();
        let clon = lon.cos();

        // Rotation from ECEF to local horizon (south, east, up)
        let south = slat * clon * direction.x + slat * slon * direction.y - clat * direction.z;
        let east = -slon * direction.x + clon * direction.y;
        let up = clat * clon * direction.x + clat * slon * direction.y + slat * direction.z;

        let r_horiz = (south * south + east * east).sqrt();
        let elevation = up.atan2(r_horiz);

        let mut azimuth = east.atan2(-south);
        if azimuth < 0.0 {
            azimuth += 2.0 * PI;
        }

        (elevation, azimuth)
    }
}

impl std::fmt::Display for ObserverPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.latitude_deg >= 0.0 { "N" } else { "S" };
        let ew = if self.longitude_deg >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}° {}, {:.4}° {}, {:.1} m",
            self.latitude_deg.abs(),
            ns,
            self.longitude_deg.abs(),
            ew,
            self.altitude_m
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wgs84_constants() {
        assert_relative_eq!(WGS84.radius_km, 6378.137);
        assert_relative_eq!(WGS84.inverse_flattening, 298.257_223_563);
        let f = 1.0 / 298.257_223_563;
        assert_relative_eq!(WGS84.eccentricity_squared(), f * (2.0 - f), epsilon = 1e-15);
    }

    #[test]
    fn test_equator_prime_meridian() {
        let pos = geodetic_to_ecef(0.0, 0.0, 0.0);
        assert_relative_eq!(pos.x, 6378.137, epsilon = 1e-9);
        assert_relative_eq!(pos.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pos.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equator_90e() {
        let pos = geodetic_to_ecef(0.0, 90.0, 0.0);
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pos.y, 6378.137, epsilon = 1e-9);
    }

    #[test]
    fn test_north_pole_is_polar_radius() {
        let pos = geodetic_to_ecef(90.0, 0.0, 0.0);
        let expected_polar_km = 6378.137 * (1.0 - 1.0 / 298.257_223_563);
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pos.z, expected_polar_km, epsilon = 1e-9);
    }

    #[test]
    fn test_matches_prime_vertical_formula() {
        // N = a / sqrt(1 - e² sin²φ); x = (N + h) cosφ cosλ; z = (N(1 - e²) + h) sinφ
        let (lat, lon, alt_m) = (43.6625_f64, -79.3950_f64, 100.0);
        let e2 = WGS84.eccentricity_squared();
        let (sl, cl) = lat.to_radians().sin_cos();
        let n = 6378.137 / (1.0 - e2 * sl * sl).sqrt();
        let h = alt_m / 1000.0;

        let pos = geodetic_to_ecef(lat, lon, alt_m);
        assert_relative_eq!(pos.x, (n + h) * cl * lon.to_radians().cos(), epsilon = 1e-9);
        assert_relative_eq!(pos.y, (n + h) * cl * lon.to_radians().sin(), epsilon = 1e-9);
        assert_relative_eq!(pos.z, (n * (1.0 - e2) + h) * sl, epsilon = 1e-9);
    }

    #[test]
    fn test_altitude_adds_along_normal() {
        let ground = geodetic_to_ecef(0.0, 0.0, 0.0);
        let high = geodetic_to_ecef(0.0, 0.0, 1000.0);
        assert_relative_eq!(high.x - ground.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_recovers_latlon_at_sea_level() {
        for &(lat, lon) in &[
            (0.0, 0.0),
            (43.6625, -79.3950),
            (-33.8688, 151.2093),
            (64.8378, -147.7164),
            (-89.5, 12.0),
            (12.5, 179.9),
        ] {
            let ecef = geodetic_to_ecef(lat, lon, 0.0);
            let (lat2, lon2, alt2) = ecef_to_geodetic(&ecef);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert!(alt2.abs() < 1e-3, "altitude residual {} m", alt2);
        }
    }

    #[test]
    fn test_inverse_recovers_altitude() {
        let ecef = geodetic_to_ecef(51.4778, -0.0015, 420_000.0);
        let (lat, lon, alt) = ecef_to_geodetic(&ecef);
        assert_relative_eq!(lat, 51.4778, epsilon = 1e-8);
        assert_relative_eq!(lon, -0.0015, epsilon = 1e-8);
        assert_relative_eq!(alt, 420_000.0, epsilon = 1e-3);
    }

    #[test]
    fn test_inverse_at_pole() {
        let ecef = geodetic_to_ecef(90.0, 0.0, 250.0);
        let (lat, _lon, alt) = ecef_to_geodetic(&ecef);
        assert_relative_eq!(lat, 90.0, epsilon = 1e-9);
        assert_relative_eq!(alt, 250.0, epsilon = 1e-3);
    }

    #[test]
    fn test_look_angles_zenith() {
        let observer = ObserverPosition::wgs84(43.6625, -79.3950, 0.0);
        let overhead = geodetic_to_ecef(43.6625, -79.3950, 400_000.0);
        let look = observer.look_angles(&overhead);
        assert_relative_eq!(look.elevation_deg, 90.0, epsilon = 1e-6);
        assert_relative_eq!(look.range_km, 400.0, epsilon = 1e-6);
    }

    #[test]
    fn test_look_angles_cardinal_directions() {
        let observer = ObserverPosition::wgs84(0.0, 0.0, 0.0);

        let north = observer.look_angles(&geodetic_to_ecef(1.0, 0.0, 0.0));
        assert!(north.azimuth_deg < 1e-6 || north.azimuth_deg > 360.0 - 1e-6);

        let east = observer.look_angles(&geodetic_to_ecef(0.0, 1.0, 0.0));
        assert_relative_eq!(east.azimuth_deg, 90.0, epsilon = 1e-6);

        let south = observer.look_angles(&geodetic_to_ecef(-1.0, 0.0, 0.0));
        assert_relative_eq!(south.azimuth_deg, 180.0, epsilon = 1e-6);

        let west = observer.look_angles(&geodetic_to_ecef(0.0, -1.0, 0.0));
        assert_relative_eq!(west.azimuth_deg, 270.0, epsilon = 1e-6);

        // Surface points curve away below the horizon
        assert!(east.elevation_deg < 0.0);
    }

    #[test]
    fn test_display() {
        let observer = ObserverPosition::wgs84(43.6625, -79.3950, 100.0);
        assert_eq!(format!("{}", observer), "43.6625° N, 79.3950° W, 100.0 m");
    }
}
