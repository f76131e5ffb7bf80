//! Tracks: named sequences of segments

use crate::{Axis, TrackPoint, TrackSegment, nearest};
use time::OffsetDateTime;

/// A named recording made of one or more segments
///
/// Derived metrics (distance, relative time, speed) run continuously across
/// segment boundaries; see [`crate::repair_track`].
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    name: Option<String>,
    comment: Option<String>,
    segments: Vec<TrackSegment>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub fn add_segment(&mut self, segment: TrackSegment) {
        self.segments.push(segment);
    }

    #[inline]
    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    /// All points of all segments, in order
    pub fn points(&self) -> impl Iterator<Item = &TrackPoint> + '_ {
        self.segments.iter().flat_map(|s| s.points().iter())
    }

    /// Mutable flattened points; invalidates each segment's cached aggregates
    pub fn points_mut(&mut self) -> impl Iterator<Item = &mut TrackPoint> + '_ {
        self.segments.iter_mut().flat_map(|s| s.points_mut().iter_mut())
    }

    /// Point at `index` in the flattened point sequence
    pub fn point(&self, index: usize) -> Option<&TrackPoint> {
        self.points().nth(index)
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(TrackSegment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(TrackSegment::is_empty)
    }

    /// Total distance in meters
    pub fn total_distance(&self) -> f64 {
        self.segments.iter().map(TrackSegment::total_distance).sum()
    }

    /// Total recorded time in milliseconds
    pub fn total_time(&self) -> i64 {
        self.segments.iter().map(TrackSegment::total_time).sum()
    }

    /// Average speed in km/h, `None` if no time was recorded
    pub fn average_speed(&self) -> Option<f64> {
        let time = self.total_time();
        (time > 0).then(|| self.total_distance() / time as f64 * 3600.0)
    }

    /// Accumulated ascending elevation in meters, `None` if any segment is unknown
    pub fn total_elevation_gain(&self) -> Option<f64> {
        self.segments
            .iter()
            .map(TrackSegment::total_elevation_gain)
            .sum()
    }

    /// First available segment start time
    pub fn start_time(&self) -> Option<OffsetDateTime> {
        self.segments.iter().find_map(TrackSegment::start_time)
    }

    /// Index of the flattened point closest to `query` on the given axis
    pub fn nearest_point(&self, axis: Axis, query: f64) -> Option<usize> {
        nearest::nearest_point(self.points(), axis, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use time::macros::datetime;

    fn timed(seconds: i64, ele: f64) -> TrackPoint {
        let start = datetime!(2024-03-10 08:00:00 UTC);
        TrackPoint::new(
            Point::new(0.0, 0.0),
            Some(start + time::Duration::seconds(seconds)),
        )
        .with_elevation(ele)
    }

    fn two_segment_track() -> Track {
        let mut track = Track::with_name("Morning ride");
        track.add_segment(TrackSegment::from_points(vec![
            timed(0, 100.0),
            timed(60, 110.0),
        ]));
        track.add_segment(TrackSegment::from_points(vec![
            timed(120, 105.0),
            timed(180, 125.0),
        ]));
        track
    }

    #[test]
    fn test_flattened_points() {
        let track = two_segment_track();
        assert_eq!(track.point_count(), 4);
        assert_eq!(track.points().count(), 4);
        assert_eq!(track.point(2).and_then(TrackPoint::elevation), Some(105.0));
        assert!(track.point(4).is_none());
    }

    #[test]
    fn test_total_time_sums_segments() {
        let track = two_segment_track();
        // The gap between the segments is not counted
        assert_eq!(track.total_time(), 120_000);
        assert_eq!(track.start_time(), Some(datetime!(2024-03-10 08:00:00 UTC)));
    }

    #[test]
    fn test_elevation_gain_sums_segments() {
        let track = two_segment_track();
        assert_eq!(track.total_elevation_gain(), Some(30.0));
    }

    #[test]
    fn test_elevation_gain_unknown_in_one_segment() {
        let mut track = two_segment_track();
        track.add_segment(TrackSegment::from_points(vec![TrackPoint::new(
            Point::new(0.0, 0.0),
            None,
        )]));
        assert_eq!(track.total_elevation_gain(), None);
    }

    #[test]
    fn test_average_speed_requires_time() {
        let track = Track::new();
        assert_eq!(track.average_speed(), None);
        assert!(track.is_empty());
    }

    #[test]
    fn test_name_and_comment() {
        let mut track = Track::new();
        assert_eq!(track.name(), None);
        track.set_name(Some("Evening run".to_string()));
        track.set_comment(Some("windy".to_string()));
        assert_eq!(track.name(), Some("Evening run"));
        assert_eq!(track.comment(), Some("windy"));
    }
}
