//! A single recorded point of a track

use geo::Point;
use time::OffsetDateTime;

/// One recorded GPS fix
///
/// The position is fixed at construction. Elevation and timestamp come from the
/// source file; relative time, cumulative distance and speed are derived by
/// [`crate::repair_track`] and default to zero until then.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPoint {
    /// Longitude (x) and latitude (y) in degrees
    position: Point<f64>,
    /// Meters above sea level, `None` when unknown
    elevation: Option<f64>,
    time: Option<OffsetDateTime>,
    /// Milliseconds since the first point of the track
    relative_time: i64,
    /// Meters from the first point of the track
    distance: f64,
    /// km/h
    speed: f64,
}

impl TrackPoint {
    /// Create a point with unknown elevation
    pub fn new(position: Point<f64>, time: Option<OffsetDateTime>) -> Self {
        Self {
            position,
            elevation: None,
            time,
            relative_time: 0,
            distance: 0.0,
            speed: 0.0,
        }
    }

    /// Builder-style elevation setter, see [`TrackPoint::set_elevation`]
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.set_elevation(elevation);
        self
    }

    #[inline]
    pub fn position(&self) -> Point<f64> {
        self.position
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    #[inline]
    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    /// Set the elevation; non-finite values mark it unknown
    pub fn set_elevation(&mut self, elevation: f64) {
        self.elevation = elevation.is_finite().then_some(elevation);
    }

    pub fn clear_elevation(&mut self) {
        self.elevation = None;
    }

    #[inline]
    pub fn time(&self) -> Option<OffsetDateTime> {
        self.time
    }

    pub fn set_time(&mut self, time: Option<OffsetDateTime>) {
        self.time = time;
    }

    /// Milliseconds elapsed since the start of the track
    #[inline]
    pub fn relative_time(&self) -> i64 {
        self.relative_time
    }

    pub(crate) fn set_relative_time(&mut self, relative_time: i64) {
        self.relative_time = relative_time;
    }

    /// Cumulative distance from the start of the track in meters
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub(crate) fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
    }

    /// Smoothed speed in km/h
    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub(crate) fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_new_point_defaults() {
        let point = TrackPoint::new(Point::new(8.5, 47.3), None);
        assert_eq!(point.latitude(), 47.3);
        assert_eq!(point.longitude(), 8.5);
        assert_eq!(point.elevation(), None);
        assert_eq!(point.time(), None);
        assert_eq!(point.relative_time(), 0);
        assert_eq!(point.distance(), 0.0);
        assert_eq!(point.speed(), 0.0);
    }

    #[test]
    fn test_non_finite_elevation_is_unknown() {
        let mut point = TrackPoint::new(Point::new(0.0, 0.0), None).with_elevation(12.5);
        assert_eq!(point.elevation(), Some(12.5));

        point.set_elevation(f64::NAN);
        assert_eq!(point.elevation(), None);

        point.set_elevation(f64::INFINITY);
        assert_eq!(point.elevation(), None);
    }

    #[test]
    fn test_zero_elevation_is_known() {
        let point = TrackPoint::new(Point::new(0.0, 0.0), None).with_elevation(0.0);
        assert_eq!(point.elevation(), Some(0.0));
    }

    #[test]
    fn test_time_roundtrip() {
        let t = datetime!(2023-07-14 06:30:00 UTC);
        let mut point = TrackPoint::new(Point::new(0.0, 0.0), Some(t));
        assert_eq!(point.time(), Some(t));
        point.set_time(None);
        assert_eq!(point.time(), None);
    }
}
