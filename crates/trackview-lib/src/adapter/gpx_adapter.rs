//! GPX (GPS Exchange Format) reader

use super::FormatAdapter;
use crate::{Result, Track, TrackCollection, TrackPoint, TrackSegment, Waypoint};
use std::io::BufRead;
use time::OffsetDateTime;

/// Reads `.gpx` files through the `gpx` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct GpxAdapter;

impl FormatAdapter for GpxAdapter {
    fn extensions(&self) -> &[&str] {
        &["gpx"]
    }

    fn parse(&self, reader: &mut dyn BufRead) -> Result<TrackCollection> {
        #[cfg(feature = "profiling")]
        profiling::scope!("gpx_adapter::parse");

        let data = gpx::read(reader)?;
        Ok(convert(data))
    }
}

fn convert(data: gpx::Gpx) -> TrackCollection {
    let mut collection = TrackCollection::new();
    collection.set_name(data.metadata.and_then(|metadata| metadata.name));

    for trk in data.tracks {
        let mut track = Track::new();
        track.set_name(trk.name);
        track.set_comment(trk.comment);

        for seg in trk.segments {
            let points = seg.points.iter().map(convert_point).collect();
            track.add_segment(TrackSegment::from_points(points));
        }

        collection.add_track(track);
    }

    for wpt in data.waypoints {
        let mut waypoint = Waypoint::new(wpt.point());
        waypoint.set_elevation(wpt.elevation);
        waypoint.set_name(wpt.name);
        waypoint.set_description(wpt.description);
        collection.add_waypoint(waypoint);
    }

    collection
}

fn convert_point(wpt: &gpx::Waypoint) -> TrackPoint {
    let time = wpt.time.map(OffsetDateTime::from);
    let mut point = TrackPoint::new(wpt.point(), time);
    if let Some(elevation) = wpt.elevation {
        point.set_elevation(elevation);
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataError;
    use time::macros::datetime;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata><name>Weekend</name></metadata>
  <wpt lat="46.5" lon="7.9">
    <ele>2061</ele>
    <name>Hut</name>
    <desc>Overnight stop</desc>
  </wpt>
  <trk>
    <name>Day one</name>
    <cmt>sunny</cmt>
    <trkseg>
      <trkpt lat="46.60" lon="7.90"><ele>1000.5</ele><time>2024-08-01T07:00:00Z</time></trkpt>
      <trkpt lat="46.61" lon="7.91"><time>2024-08-01T07:05:00Z</time></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="46.62" lon="7.92"><ele>1100</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    fn parse(text: &str) -> Result<TrackCollection> {
        GpxAdapter.parse(&mut text.as_bytes())
    }

    #[test]
    fn test_parse_tracks_and_segments() {
        let collection = parse(SAMPLE).unwrap();

        assert_eq!(collection.name(), Some("Weekend"));
        assert_eq!(collection.tracks().len(), 1);

        let track = &collection.tracks()[0];
        assert_eq!(track.name(), Some("Day one"));
        assert_eq!(track.comment(), Some("sunny"));
        assert_eq!(track.segments().len(), 2);
        assert_eq!(track.point_count(), 3);
    }

    #[test]
    fn test_parse_point_fields() {
        let collection = parse(SAMPLE).unwrap();
        let points: Vec<&TrackPoint> = collection.tracks()[0].points().collect();

        assert_eq!(points[0].latitude(), 46.60);
        assert_eq!(points[0].longitude(), 7.90);
        assert_eq!(points[0].elevation(), Some(1000.5));
        assert_eq!(points[0].time(), Some(datetime!(2024-08-01 07:00:00 UTC)));

        // Missing elevation stays unknown rather than zero
        assert_eq!(points[1].elevation(), None);
        assert_eq!(points[2].time(), None);
    }

    #[test]
    fn test_parse_waypoints() {
        let collection = parse(SAMPLE).unwrap();
        let waypoint = &collection.waypoints()[0];

        assert_eq!(waypoint.name(), Some("Hut"));
        assert_eq!(waypoint.description(), Some("Overnight stop"));
        assert_eq!(waypoint.elevation(), Some(2061.0));
        assert_eq!(waypoint.position().y(), 46.5);
    }

    #[test]
    fn test_invalid_document_is_error() {
        let result = parse("<gpx><trk><trkseg><trkpt lat=\"x\"");
        assert!(matches!(result, Err(DataError::GpxParse(_))));
    }
}
