//! Console report of a scan

use crate::settings::Settings;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use trackview_lib::{Axis, DataError, Track, TrackCollection, TrackLoadListener, export};

/// Prints one summary per loaded file and optional scrubber markers
#[derive(Debug, Default)]
pub struct ConsoleListener {
    export_dir: Option<PathBuf>,
    marker_distance: Option<f64>,
    marker_time: Option<f64>,
    loaded: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl ConsoleListener {
    pub fn new(settings: &Settings) -> Self {
        Self {
            export_dir: settings.export_dir.clone(),
            marker_distance: settings.marker_distance,
            marker_time: settings.marker_time,
            ..Default::default()
        }
    }

    pub fn loaded(&self) -> usize {
        self.loaded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    fn export(&self, path: &Path, collection: &TrackCollection) {
        let Some(dir) = &self.export_dir else {
            return;
        };
        let Some(target) = export_path(dir, path) else {
            return;
        };
        match export::save_gpx(collection, &target) {
            Ok(()) => tracing::info!("Exported {}", target.display()),
            Err(err) => {
                tracing::error!("Could not export {}: {}", target.display(), err);
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn print_markers(&self, track: &Track) {
        if let Some(meters) = self.marker_distance {
            println!(
                "    at {:.0} m: {}",
                meters,
                describe_marker(track, Axis::Distance, meters)
            );
        }
        if let Some(seconds) = self.marker_time {
            println!(
                "    at {}: {}",
                format_duration((seconds * 1000.0) as i64),
                describe_marker(track, Axis::Time, seconds * 1000.0)
            );
        }
    }
}

impl TrackLoadListener for ConsoleListener {
    fn start_reading(&self) {
        tracing::info!("Reading tracks");
    }

    fn track_loaded(&self, path: &Path, collection: TrackCollection) {
        self.loaded.fetch_add(1, Ordering::Relaxed);

        println!(
            "{} ({}, started {}): {} track(s), {} point(s), {}",
            collection.name().unwrap_or("unnamed"),
            path.display(),
            format_start(collection.start_time()),
            collection.tracks().len(),
            collection.point_count(),
            summarize(
                collection.total_distance(),
                collection.total_time(),
                collection.total_elevation_gain()
            )
        );
        for track in collection.tracks() {
            println!(
                "  {}: {}",
                track.name().unwrap_or("unnamed"),
                summarize(
                    track.total_distance(),
                    track.total_time(),
                    track.total_elevation_gain()
                )
            );
            self.print_markers(track);
        }

        self.export(path, &collection);
    }

    fn report_error(&self, message: &str, cause: &DataError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::error!("{}: {}", message, cause);
    }

    fn read_cancelled(&self, path: &Path) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("Cancelled {}", path.display());
    }

    fn finish_reading(&self) {
        tracing::info!(
            "Finished reading: {} loaded, {} failed, {} cancelled",
            self.loaded(),
            self.failed(),
            self.cancelled.load(Ordering::Relaxed)
        );
    }
}

fn summarize(distance: f64, millis: i64, elevation_gain: Option<f64>) -> String {
    let speed = if millis > 0 {
        format!("{:.1} km/h", distance * 3600.0 / millis as f64)
    } else {
        "no speed".to_string()
    };
    let gain = match elevation_gain {
        Some(gain) => format!("+{gain:.0} m"),
        None => "elevation unknown".to_string(),
    };
    format!(
        "{:.2} km in {}, {}, {}",
        distance / 1000.0,
        format_duration(millis),
        speed,
        gain
    )
}

fn describe_marker(track: &Track, axis: Axis, query: f64) -> String {
    let Some(index) = track.nearest_point(axis, query) else {
        return "no point".to_string();
    };
    let Some(point) = track.point(index) else {
        return "no point".to_string();
    };
    let elevation = point
        .elevation()
        .map(|e| format!("{e:.0} m"))
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "point {} ({:.5}, {:.5}), {:.0} m, {}, {:.1} km/h, elevation {}",
        index,
        point.latitude(),
        point.longitude(),
        point.distance(),
        format_duration(point.relative_time()),
        point.speed(),
        elevation
    )
}

/// Export target keeping the source extension, so `ride.gpx` and `ride.tcx`
/// do not overwrite each other
fn export_path(dir: &Path, source: &Path) -> Option<PathBuf> {
    let mut name = source.file_name()?.to_os_string();
    name.push(".gpx");
    Some(dir.join(name))
}

/// RFC 3339 start time, or "unknown time" for untimed recordings
fn format_start(start: Option<OffsetDateTime>) -> String {
    start
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "unknown time".to_string())
}

/// `h:mm:ss` for a duration in milliseconds
fn format_duration(millis: i64) -> String {
    let seconds = millis / 1000;
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
