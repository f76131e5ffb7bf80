//! TrackCollection - everything parsed from one file
//!
//! A collection holds the tracks and the waypoints of a single input file.
//! Waypoints are independent of the tracks; they are only associated by
//! belonging to the same collection.

use crate::Track;
use geo::{BoundingRect, MultiPoint, Point, Rect};
use time::OffsetDateTime;

/// A named point of interest
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    position: Point<f64>,
    name: Option<String>,
    description: Option<String>,
    elevation: Option<f64>,
}

impl Waypoint {
    pub fn new(position: Point<f64>) -> Self {
        Self {
            position,
            name: None,
            description: None,
            elevation: None,
        }
    }

    #[inline]
    pub fn position(&self) -> Point<f64> {
        self.position
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    /// Non-finite values mark the elevation unknown
    pub fn set_elevation(&mut self, elevation: Option<f64>) {
        self.elevation = elevation.filter(|e| e.is_finite());
    }
}

/// All tracks and waypoints of one file
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackCollection {
    name: Option<String>,
    tracks: Vec<Track>,
    waypoints: Vec<Waypoint>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name: the explicit name, or the first track's name if unset or blank
    pub fn name(&self) -> Option<&str> {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(name),
            _ => self.tracks.first().and_then(Track::name),
        }
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[inline]
    pub fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    /// Drop tracks that contain no points
    pub fn remove_empty_tracks(&mut self) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|track| !track.is_empty());
        before - self.tracks.len()
    }

    pub fn add_waypoint(&mut self, waypoint: Waypoint) {
        self.waypoints.push(waypoint);
    }

    #[inline]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn point_count(&self) -> usize {
        self.tracks.iter().map(Track::point_count).sum()
    }

    /// Total distance in meters
    pub fn total_distance(&self) -> f64 {
        self.tracks.iter().map(Track::total_distance).sum()
    }

    /// Total recorded time in milliseconds
    pub fn total_time(&self) -> i64 {
        self.tracks.iter().map(Track::total_time).sum()
    }

    /// Average speed in km/h, `None` if no time was recorded
    pub fn average_speed(&self) -> Option<f64> {
        let time = self.total_time();
        (time > 0).then(|| self.total_distance() / time as f64 * 3600.0)
    }

    /// Accumulated ascending elevation in meters, `None` if any track is unknown
    pub fn total_elevation_gain(&self) -> Option<f64> {
        self.tracks.iter().map(Track::total_elevation_gain).sum()
    }

    pub fn start_time(&self) -> Option<OffsetDateTime> {
        self.tracks.iter().find_map(Track::start_time)
    }

    /// Bounding box of all track points and waypoints in degrees (x = lon, y = lat)
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        let positions: MultiPoint<f64> = self
            .tracks
            .iter()
            .flat_map(Track::points)
            .map(|p| p.position())
            .chain(self.waypoints.iter().map(Waypoint::position))
            .collect();
        positions.bounding_rect()
    }
}
