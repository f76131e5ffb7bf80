//! Track segments and their position-only route view

use crate::TrackPoint;
use crate::utils;
use geo::Point;
use std::sync::OnceLock;
use time::OffsetDateTime;

/// A contiguous, gap-free run of recorded points
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackSegment {
    points: Vec<TrackPoint>,
    /// Ascending elevation gain, computed on first request.
    /// Reset whenever the points are handed out mutably.
    #[cfg_attr(feature = "serde", serde(skip))]
    elevation_gain: OnceLock<Option<f64>>,
}

/// Read-only view of the positions of a segment, backed by its points
#[derive(Clone, Copy, Debug)]
pub struct Route<'a> {
    points: &'a [TrackPoint],
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackSegment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<TrackPoint>) -> Self {
        Self {
            points,
            elevation_gain: OnceLock::new(),
        }
    }

    pub fn push(&mut self, point: TrackPoint) {
        self.elevation_gain = OnceLock::new();
        self.points.push(point);
    }

    #[inline]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Mutable access to the points; invalidates cached aggregates
    pub fn points_mut(&mut self) -> &mut [TrackPoint] {
        self.elevation_gain = OnceLock::new();
        &mut self.points
    }

    #[inline]
    pub fn route(&self) -> Route<'_> {
        Route {
            points: &self.points,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Accumulated ascending elevation in meters
    ///
    /// `None` if any point has unknown elevation. An empty segment climbs 0 m.
    pub fn total_elevation_gain(&self) -> Option<f64> {
        *self
            .elevation_gain
            .get_or_init(|| Self::compute_elevation_gain(&self.points))
    }

    fn compute_elevation_gain(points: &[TrackPoint]) -> Option<f64> {
        let mut total = 0.0;
        let mut prev_ele: Option<f64> = None;

        for point in points {
            let ele = point.elevation()?;
            if let Some(prev) = prev_ele {
                let delta = ele - prev;
                if delta > 0.0 {
                    total += delta;
                }
            }
            prev_ele = Some(ele);
        }

        Some(total)
    }

    /// Distance covered by this segment in meters (from the cumulative distances)
    pub fn total_distance(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.distance() - first.distance(),
            _ => 0.0,
        }
    }

    /// Duration of this segment in milliseconds
    ///
    /// Zero with fewer than two points or when either end lacks a timestamp.
    pub fn total_time(&self) -> i64 {
        if self.points.len() < 2 {
            return 0;
        }
        let first = self.points.first().and_then(TrackPoint::time);
        let last = self.points.last().and_then(TrackPoint::time);
        match (first, last) {
            (Some(start), Some(end)) => utils::millis_between(start, end),
            _ => 0,
        }
    }

    /// Mean of the point speeds in km/h, `None` for an empty segment
    pub fn average_speed(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum: f64 = self.points.iter().map(TrackPoint::speed).sum();
        Some(sum / self.points.len() as f64)
    }

    pub fn start_time(&self) -> Option<OffsetDateTime> {
        self.points.first().and_then(TrackPoint::time)
    }
}

impl<'a> Route<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Point<f64>> {
        self.points.get(index).map(TrackPoint::position)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Point<f64>> + 'a {
        self.points.iter().map(TrackPoint::position)
    }
}

impl<'a> IntoIterator for Route<'a> {
    type Item = Point<f64>;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, TrackPoint>, fn(&TrackPoint) -> Point<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points
            .iter()
            .map(TrackPoint::position as fn(&TrackPoint) -> Point<f64>)
    }
}
