//! Utility functions for geodesic distances and timestamps

use geo::Point;
use time::OffsetDateTime;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance between two geographic positions
///
/// Positions are `geo::Point`s with x = longitude and y = latitude in degrees,
/// the same convention the `gpx` crate uses. Implementations must return
/// non-negative meters and be symmetric.
pub trait GeoDistance: Send + Sync {
    fn distance(&self, a: Point<f64>, b: Point<f64>) -> f64;
}

/// Great-circle distance on a sphere of radius [`EARTH_RADIUS_M`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl GeoDistance for Haversine {
    #[inline]
    fn distance(&self, a: Point<f64>, b: Point<f64>) -> f64 {
        let lat1 = a.y().to_radians();
        let lat2 = b.y().to_radians();
        let delta_lat = (b.y() - a.y()).to_radians();
        let delta_lon = (b.x() - a.x()).to_radians();

        let h = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

        EARTH_RADIUS_M * c
    }
}

/// Signed milliseconds from `start` to `end`
#[inline]
pub fn millis_between(start: OffsetDateTime, end: OffsetDateTime) -> i64 {
    let millis = (end - start).whole_milliseconds();
    millis.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = Point::new(-0.1278, 51.5074);
        assert_eq!(Haversine.distance(p, p), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        let d = Haversine.distance(a, b);
        // One degree of arc is about 111.2 km on this sphere
        assert!((d - 111_194.9).abs() < 1.0);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let london = Point::new(-0.1278, 51.5074);
        let paris = Point::new(2.3522, 48.8566);
        let there = Haversine.distance(london, paris);
        let back = Haversine.distance(paris, london);
        assert!((there - back).abs() < 1e-6);
        assert!(there > 340_000.0 && there < 345_000.0);
    }

    #[test]
    fn test_millis_between() {
        let start = datetime!(2024-05-01 10:00:00 UTC);
        let end = datetime!(2024-05-01 10:00:01.250 UTC);
        assert_eq!(millis_between(start, end), 1250);
        assert_eq!(millis_between(end, start), -1250);
    }
}
