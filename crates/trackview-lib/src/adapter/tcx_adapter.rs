//! TCX (Garmin Training Center) reader
//!
//! Every lap of an activity becomes one track with a single segment holding
//! the points of all `<Track>` elements of that lap. Trackpoints without a
//! `<Position>` (e.g. recorded while paused indoors) are skipped.

use super::FormatAdapter;
use crate::{DataError, Result, Track, TrackCollection, TrackPoint, TrackSegment};
use geo::Point;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Reads `.tcx` files with `quick-xml`
#[derive(Debug, Clone, Copy, Default)]
pub struct TcxAdapter;

impl FormatAdapter for TcxAdapter {
    fn extensions(&self) -> &[&str] {
        &["tcx"]
    }

    fn parse(&self, reader: &mut dyn BufRead) -> Result<TrackCollection> {
        #[cfg(feature = "profiling")]
        profiling::scope!("tcx_adapter::parse");

        let mut xml = String::new();
        reader.read_to_string(&mut xml)?;
        parse_document(&xml)
    }
}

fn parse_document(xml: &str) -> Result<TrackCollection> {
    let mut reader = Reader::from_str(xml);
    let mut collection = TrackCollection::new();
    let mut found_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"TrainingCenterDatabase" if !found_root => found_root = true,
                _ if !found_root => return Err(not_tcx()),
                b"Activity" => parse_activity(&mut reader, &mut collection)?,
                _ => {}
            },
            Event::Empty(_) if !found_root => return Err(not_tcx()),
            Event::Eof => break,
            _ => {}
        }
    }

    if !found_root {
        return Err(not_tcx());
    }
    Ok(collection)
}

fn parse_activity<'a>(
    reader: &mut Reader<&'a [u8]>,
    collection: &mut TrackCollection,
) -> Result<()> {
    let mut name: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Id" => name = Some(read_text(reader, &e)?),
                b"Lap" => {
                    let mut track = Track::new();
                    track.set_name(name.clone());
                    track.add_segment(parse_lap(reader)?);
                    collection.add_track(track);
                }
                _ => skip(reader, &e)?,
            },
            Event::End(e) if e.local_name().as_ref() == b"Activity" => return Ok(()),
            Event::Eof => return Err(truncated("Activity")),
            _ => {}
        }
    }
}

fn parse_lap<'a>(reader: &mut Reader<&'a [u8]>) -> Result<TrackSegment> {
    let mut segment = TrackSegment::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Track" => parse_track(reader, &mut segment)?,
                _ => skip(reader, &e)?,
            },
            Event::End(e) if e.local_name().as_ref() == b"Lap" => return Ok(segment),
            Event::Eof => return Err(truncated("Lap")),
            _ => {}
        }
    }
}

fn parse_track<'a>(reader: &mut Reader<&'a [u8]>, segment: &mut TrackSegment) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Trackpoint" => {
                    if let Some(point) = parse_trackpoint(reader)? {
                        segment.push(point);
                    }
                }
                _ => skip(reader, &e)?,
            },
            Event::End(e) if e.local_name().as_ref() == b"Track" => return Ok(()),
            Event::Eof => return Err(truncated("Track")),
            _ => {}
        }
    }
}

fn parse_trackpoint<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Option<TrackPoint>> {
    let mut time: Option<OffsetDateTime> = None;
    let mut position: Option<Point<f64>> = None;
    let mut altitude: Option<f64> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Time" => {
                    let text = read_text(reader, &e)?;
                    let parsed = OffsetDateTime::parse(&text, &Rfc3339).map_err(|err| {
                        DataError::InvalidData(format!("invalid <Time> value '{text}': {err}"))
                    })?;
                    time = Some(parsed);
                }
                b"Position" => position = parse_position(reader)?,
                b"AltitudeMeters" => {
                    altitude = Some(parse_number(&read_text(reader, &e)?, "AltitudeMeters")?)
                }
                _ => skip(reader, &e)?,
            },
            Event::End(e) if e.local_name().as_ref() == b"Trackpoint" => break,
            Event::Eof => return Err(truncated("Trackpoint")),
            _ => {}
        }
    }

    Ok(position.map(|position| {
        let mut point = TrackPoint::new(position, time);
        if let Some(altitude) = altitude {
            point.set_elevation(altitude);
        }
        point
    }))
}

fn parse_position<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Option<Point<f64>>> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"LatitudeDegrees" => {
                    lat = Some(parse_number(&read_text(reader, &e)?, "LatitudeDegrees")?)
                }
                b"LongitudeDegrees" => {
                    lon = Some(parse_number(&read_text(reader, &e)?, "LongitudeDegrees")?)
                }
                _ => skip(reader, &e)?,
            },
            Event::End(e) if e.local_name().as_ref() == b"Position" => break,
            Event::Eof => return Err(truncated("Position")),
            _ => {}
        }
    }

    Ok(lat.zip(lon).map(|(lat, lon)| Point::new(lon, lat)))
}

/// Text content of a leaf element, trimmed
fn read_text<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'a>) -> Result<String> {
    let text = reader.read_text(start.name())?;
    Ok(text.trim().to_string())
}

fn skip<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'a>) -> Result<()> {
    reader.read_to_end(start.name())?;
    Ok(())
}

fn parse_number(text: &str, element: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| DataError::InvalidData(format!("invalid <{element}> value '{text}'")))
}

fn not_tcx() -> DataError {
    DataError::InvalidData("root element is not TrainingCenterDatabase".to_string())
}

fn truncated(element: &str) -> DataError {
    DataError::InvalidData(format!("unexpected end of document inside <{element}>"))
}
