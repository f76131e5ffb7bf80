//! Track repair pipeline
//!
//! Fills in the data a raw recording lacks so tracks can be compared and
//! plotted. Four passes run in a fixed order over the flattened points of a
//! track (all segments concatenated):
//!
//! 1. elevation interpolation between known neighbours, weighted by time
//! 2. cumulative distance accumulation
//! 3. relative time since the first point
//! 4. speed estimation over a window of ±2 points
//!
//! Segment boundaries do not reset distance or time. Input points are assumed
//! to be in time order; out-of-order timestamps are reported but not fixed.

use crate::utils::{self, GeoDistance};
use crate::{CancellationToken, Result, Track, TrackPoint};

/// Half-width of the speed estimation window, in points
const SPEED_WINDOW: usize = 2;

/// What the repair pipeline did to a track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Points whose elevation was interpolated
    pub interpolated_elevations: usize,
    /// Points left with unknown elevation
    pub unresolved_elevations: usize,
    /// Consecutive runs of unresolved points (one warning each)
    pub unresolved_runs: usize,
    /// Points whose timestamp is earlier than their predecessor's
    pub out_of_order_points: usize,
}

/// Run all repair passes over `track` in place
///
/// `cancel` is checked before every point; a cancelled repair returns
/// [`crate::DataError::Cancelled`] and leaves the track partially repaired.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn repair_track(
    track: &mut Track,
    distance: &dyn GeoDistance,
    cancel: &CancellationToken,
) -> Result<RepairReport> {
    let mut report = RepairReport::default();
    let mut points: Vec<&mut TrackPoint> = track.points_mut().collect();

    if points.is_empty() {
        return Ok(report);
    }

    fix_invalid_elevations(&mut points, cancel, &mut report)?;
    fix_distances(&mut points, distance, cancel)?;
    fix_times(&mut points, cancel, &mut report)?;
    compute_speed(&mut points, cancel)?;

    Ok(report)
}

fn fix_invalid_elevations(
    points: &mut [&mut TrackPoint],
    cancel: &CancellationToken,
    report: &mut RepairReport,
) -> Result<()> {
    // next_known[i]: first index after i with a recorded elevation
    let mut next_known = vec![None; points.len()];
    let mut next = None;
    for i in (0..points.len()).rev() {
        next_known[i] = next;
        if points[i].elevation().is_some() {
            next = Some(i);
        }
    }

    let mut last_known: Option<usize> = None;
    let mut in_unresolved_run = false;

    for i in 0..points.len() {
        cancel.check()?;

        if points[i].elevation().is_some() {
            last_known = Some(i);
            in_unresolved_run = false;
            continue;
        }

        let elevation = match (last_known, next_known[i]) {
            (Some(prev), Some(next)) => interpolate(&*points[prev], &*points[next], &*points[i]),
            _ => None,
        };

        match elevation {
            Some(elevation) => {
                points[i].set_elevation(elevation);
                report.interpolated_elevations += 1;
                in_unresolved_run = false;
            }
            None => {
                report.unresolved_elevations += 1;
                if !in_unresolved_run {
                    report.unresolved_runs += 1;
                    tracing::warn!("Could not compute elevation starting at point {}", i);
                }
                in_unresolved_run = true;
            }
        }
    }

    Ok(())
}

/// Elevation at `point` on the line between `prev` and `next`, by time fraction
fn interpolate(prev: &TrackPoint, next: &TrackPoint, point: &TrackPoint) -> Option<f64> {
    let t_prev = prev.time()?;
    let t_next = next.time()?;
    let t = point.time()?;
    let ele_prev = prev.elevation()?;
    let ele_next = next.elevation()?;

    let span = utils::millis_between(t_prev, t_next);
    let fraction = if span == 0 {
        0.0
    } else {
        utils::millis_between(t_prev, t) as f64 / span as f64
    };

    Some((1.0 - fraction) * ele_prev + fraction * ele_next)
}

fn fix_distances(
    points: &mut [&mut TrackPoint],
    distance: &dyn GeoDistance,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut prev: Option<(geo::Point<f64>, f64)> = None;

    for point in points.iter_mut() {
        cancel.check()?;
        let total = match prev {
            Some((prev_pos, prev_total)) => prev_total + distance.distance(prev_pos, point.position()),
            None => 0.0,
        };
        point.set_distance(total);
        prev = Some((point.position(), total));
    }

    Ok(())
}

fn fix_times(
    points: &mut [&mut TrackPoint],
    cancel: &CancellationToken,
    report: &mut RepairReport,
) -> Result<()> {
    let Some(start) = points.iter().find_map(|p| p.time()) else {
        // No timestamps at all: every relative time stays at zero
        for point in points.iter_mut() {
            point.set_relative_time(0);
        }
        return Ok(());
    };

    // Points without a timestamp keep the relative time of their predecessor
    let mut previous = 0;
    for point in points.iter_mut() {
        cancel.check()?;
        let relative = match point.time() {
            Some(time) => utils::millis_between(start, time),
            None => previous,
        };
        if relative < previous {
            report.out_of_order_points += 1;
        }
        point.set_relative_time(relative);
        previous = relative;
    }

    if report.out_of_order_points > 0 {
        tracing::warn!(
            "{} point(s) are earlier than their predecessor; derived speed may be negative",
            report.out_of_order_points
        );
    }

    Ok(())
}

fn compute_speed(points: &mut [&mut TrackPoint], cancel: &CancellationToken) -> Result<()> {
    let last = points.len() - 1;

    for index in 0..points.len() {
        cancel.check()?;

        let low = index.saturating_sub(SPEED_WINDOW);
        let high = (index + SPEED_WINDOW).min(last);

        let delta_distance = points[high].distance() - points[low].distance(); // meters
        let delta_time = points[high].relative_time() - points[low].relative_time(); // milliseconds

        if delta_time != 0 {
            points[index].set_speed(delta_distance * 3600.0 / delta_time as f64);
        }
    }

    Ok(())
}
