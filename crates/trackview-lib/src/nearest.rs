//! Nearest-point lookup on a time or distance axis
//!
//! Map and chart views both translate a user interaction into a scalar on one
//! axis and use this lookup to find the matching point of each displayed
//! track, which keeps their cursors in sync.

use crate::{Track, TrackPoint};

/// The scalar a point is located by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Relative time in milliseconds
    Time,
    /// Cumulative distance in meters
    Distance,
}

impl Axis {
    #[inline]
    pub fn value(self, point: &TrackPoint) -> f64 {
        match self {
            Axis::Time => point.relative_time() as f64,
            Axis::Distance => point.distance(),
        }
    }
}

/// Index of the value closest to `query` in a non-decreasing sequence
///
/// Returns `None` when `query` lies before the first value or after the last
/// one; callers hide their marker in that case instead of clamping. On an exact
/// tie between two neighbours the later index wins.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn nearest_index(values: &[f64], query: f64) -> Option<usize> {
    let first = *values.first()?;
    if query.is_nan() || query < first {
        return None;
    }

    values
        .windows(2)
        .position(|pair| pair[1] >= query)
        .map(|prev| {
            let dist_prev = query - values[prev];
            let dist_next = values[prev + 1] - query;
            if dist_next > dist_prev { prev } else { prev + 1 }
        })
}

/// [`nearest_index`] over the values of `points` on `axis`
pub fn nearest_point<'a, I>(points: I, axis: Axis, query: f64) -> Option<usize>
where
    I: IntoIterator<Item = &'a TrackPoint>,
{
    let values: Vec<f64> = points.into_iter().map(|p| axis.value(p)).collect();
    nearest_index(&values, query)
}

/// One lookup per track, so a single interaction can mark every displayed view
pub fn nearest_points<'a, I>(tracks: I, axis: Axis, query: f64) -> Vec<Option<usize>>
where
    I: IntoIterator<Item = &'a Track>,
{
    tracks
        .into_iter()
        .map(|track| track.nearest_point(axis, query))
        .collect()
}
