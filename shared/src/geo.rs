//! Tangent-plane projection
//!
//! Equirectangular approximation of GNSS positions onto a flat plane centred
//! on an origin. One degree of latitude is a fixed arc on a sphere of mean
//! Earth radius (raised by the origin altitude); one degree of longitude is
//! that arc scaled by `cos(origin.latitude)`.
//!
//! Good to a few centimeters over the few hundred meters a formation spans.
//! Degrades near the poles and beyond a few kilometers; this is not a
//! geodesic solution.

use crate::tuning::EARTH_RADIUS_M;
use crate::{GpsPoint, LocalOffset};

impl GpsPoint {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Finite coordinates within the valid latitude/longitude ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl LocalOffset {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal distance to another offset, ignoring altitude
    pub fn horizontal_distance(&self, other: &LocalOffset) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Meters per degree of latitude and longitude at `origin`
pub fn degree_lengths(origin: &GpsPoint) -> (f64, f64) {
    let radius = EARTH_RADIUS_M + origin.altitude;
    let lat_unit = radius.to_radians();
    let lon_unit = radius * origin.latitude.to_radians().cos() * std::f64::consts::PI / 180.0;
    (lat_unit, lon_unit)
}

/// Project `point` onto the tangent plane of `origin`
///
/// North and east are positive; `z` is the plain altitude difference.
pub fn project(point: &GpsPoint, origin: &GpsPoint) -> LocalOffset {
    let (lat_unit, lon_unit) = degree_lengths(origin);
    LocalOffset {
        x: (point.longitude - origin.longitude) * lon_unit,
        y: (point.latitude - origin.latitude) * lat_unit,
        z: point.altitude - origin.altitude,
    }
}

/// Signed smallest difference `a - b` between two headings, in (-180, 180]
pub fn heading_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Normalize a heading into [0, 360)
pub fn normalize_heading(heading: f64) -> f64 {
    heading.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_origin_projects_to_zero() {
        for origin in [
            GpsPoint::new(0.0, 0.0, 0.0),
            GpsPoint::new(31.2304, 121.4737, 12.0),
            GpsPoint::new(-45.5, -170.25, 800.0),
        ] {
            let offset = project(&origin, &origin);
            assert_eq!(offset, LocalOffset::new(0.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_sign_conventions() {
        let origin = GpsPoint::new(10.0, 20.0, 0.0);

        let north_east = project(&GpsPoint::new(10.001, 20.001, 5.0), &origin);
        assert!(north_east.x > 0.0);
        assert!(north_east.y > 0.0);
        assert_eq!(north_east.z, 5.0);

        let south_west = project(&GpsPoint::new(9.999, 19.999, -1.0), &origin);
        assert!(south_west.x < 0.0);
        assert!(south_west.y < 0.0);
        assert_eq!(south_west.z, -1.0);
    }

    #[test]
    fn test_degree_lengths_at_equator() {
        let (lat_unit, lon_unit) = degree_lengths(&GpsPoint::new(0.0, 0.0, 0.0));
        // 6.371e6 * pi / 180
        assert!(close(lat_unit, 111_194.93, 0.01));
        assert!(close(lon_unit, lat_unit, 1e-6));
    }

    #[test]
    fn test_longitude_scaled_by_latitude() {
        let (lat_unit, lon_unit) = degree_lengths(&GpsPoint::new(60.0, 0.0, 0.0));
        assert!(close(lon_unit, lat_unit * 0.5, 1e-6));
    }

    #[test]
    fn test_small_offsets_are_antisymmetric() {
        let origin = GpsPoint::new(47.3977, 8.5456, 488.0);
        let point = GpsPoint::new(47.3981, 8.5461, 488.0);

        let forward = project(&point, &origin);
        let backward = project(&origin, &point);

        // Compensate for the scale factor of each origin
        let (_, lon_origin) = degree_lengths(&origin);
        let (_, lon_point) = degree_lengths(&point);
        assert!(close(forward.x / lon_origin, -backward.x / lon_point, 1e-12));
        assert!(close(forward.y, -backward.y, 1e-6));
    }

    #[test]
    fn test_heading_delta_wraps() {
        assert!(close(heading_delta(359.0, 1.0), -2.0, 1e-9));
        assert!(close(heading_delta(1.0, 359.0), 2.0, 1e-9));
        assert!(close(heading_delta(90.0, 90.0), 0.0, 1e-9));
        assert!(close(normalize_heading(-90.0), 270.0, 1e-9));
    }
}
