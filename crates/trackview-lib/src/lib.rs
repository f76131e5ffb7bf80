//! Trackview Library - Loading and Repairing GPS Track Collections
//!
//! This library turns a directory of GPS recordings into repaired, comparable
//! track data. Each file becomes one [`TrackCollection`]; every track in it is
//! passed through the repair pipeline before being handed to the caller.
//!
//! # Architecture
//!
//! - **[`TrackCollection`]**, **[`Track`]**, **[`TrackSegment`]**, **[`TrackPoint`]**,
//!   **[`Waypoint`]**: the in-memory model shared by every file format
//! - **[`FormatAdapter`]**: parses raw bytes of one file format (GPX, TCX)
//! - **[`repair_track`]**: elevation interpolation, distance accumulation,
//!   relative time and windowed speed, in that order
//! - **[`nearest_index`]**: maps a scrubber value (time or distance) to a point
//! - **[`TrackLoader`]**: bounded worker pool with cancellable directory scans
//!
//! # Data Flow
//!
//! ```text
//! directory ─► TrackLoader ─► FormatAdapter ─► repair_track ─► TrackLoadListener
//! ```

pub mod adapter;
mod collection;
pub mod export;
mod loader;
mod nearest;
mod point;
mod repair;
mod segment;
mod track;
pub mod utils;

// Public API exports
pub use adapter::{AdapterRegistry, FormatAdapter, GpxAdapter, TcxAdapter};
pub use collection::{TrackCollection, Waypoint};
pub use loader::{
    CancellationToken, FileOutcome, LoaderConfig, ScanHandle, TrackLoadListener, TrackLoader,
};
pub use nearest::{Axis, nearest_index, nearest_point, nearest_points};
pub use point::TrackPoint;
pub use repair::{RepairReport, repair_track};
pub use segment::{Route, TrackSegment};
pub use track::Track;
pub use utils::{GeoDistance, Haversine};

/// Error types for loading and repairing tracks
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid track data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Loading was cancelled")]
    Cancelled,

    #[error("Worker task ended without producing a result")]
    TaskLost,
}

impl DataError {
    /// Whether this error only signals a cancelled load
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DataError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn() -> TrackCollection = TrackCollection::new;
        let _: fn() -> LoaderConfig = LoaderConfig::default;
        let _: fn(&[f64], f64) -> Option<usize> = nearest_index;
    }

    #[test]
    fn test_cancellation_is_distinguished() {
        assert!(DataError::Cancelled.is_cancellation());
        assert!(!DataError::TaskLost.is_cancellation());
        assert!(!DataError::InvalidData("bad".to_string()).is_cancellation());
    }
}
