//! GPX 1.1 export
//!
//! Writes the repaired model back out as plain GPX. Derived fields (distance,
//! relative time, speed) are not part of the format and are recomputed on the
//! next load. Unknown elevations are omitted rather than written as zero.

use crate::{Result, Track, TrackCollection, TrackPoint, Waypoint};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Build a [`gpx::Gpx`] document from `collection`
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn to_gpx(collection: &TrackCollection) -> gpx::Gpx {
    let mut data = gpx::Gpx::default();
    data.version = gpx::GpxVersion::Gpx11;
    data.creator = Some(env!("CARGO_PKG_NAME").to_string());

    if let Some(name) = collection.name() {
        let mut metadata = gpx::Metadata::default();
        metadata.name = Some(name.to_string());
        data.metadata = Some(metadata);
    }

    data.tracks = collection.tracks().iter().map(export_track).collect();
    data.waypoints = collection.waypoints().iter().map(export_waypoint).collect();
    data
}

/// Serialize `collection` as GPX into `writer`
pub fn write_gpx<W: Write>(collection: &TrackCollection, writer: W) -> Result<()> {
    gpx::write(&to_gpx(collection), writer)?;
    Ok(())
}

/// Write `collection` to a GPX file at `path`, replacing any existing file
pub fn save_gpx(collection: &TrackCollection, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_gpx(collection, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn export_track(track: &Track) -> gpx::Track {
    let mut trk = gpx::Track::default();
    trk.name = track.name().map(str::to_string);
    trk.comment = track.comment().map(str::to_string);

    for segment in track.segments() {
        let mut trkseg = gpx::TrackSegment::default();
        trkseg.points = segment.points().iter().map(export_point).collect();
        trk.segments.push(trkseg);
    }
    trk
}

fn export_point(point: &TrackPoint) -> gpx::Waypoint {
    let mut wpt = gpx::Waypoint::new(point.position());
    wpt.elevation = point.elevation();
    wpt.time = point.time().map(gpx::Time::from);
    wpt
}

fn export_waypoint(waypoint: &Waypoint) -> gpx::Waypoint {
    let mut wpt = gpx::Waypoint::new(waypoint.position());
    wpt.elevation = waypoint.elevation();
    wpt.name = waypoint.name().map(str::to_string);
    wpt.description = waypoint.description().map(str::to_string);
    wpt
}
