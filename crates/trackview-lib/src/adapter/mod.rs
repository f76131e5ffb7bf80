//! File format adapters
//!
//! Each adapter turns the bytes of one file format into a [`TrackCollection`].
//! The [`AdapterRegistry`] picks the adapter for a file by its extension.

mod gpx_adapter;
mod tcx_adapter;

pub use gpx_adapter::GpxAdapter;
pub use tcx_adapter::TcxAdapter;

use crate::{Result, TrackCollection};
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

/// Parser for one track file format
pub trait FormatAdapter: Send + Sync {
    /// Lower-case file extensions (without dot) handled by this adapter
    fn extensions(&self) -> &[&str];

    /// Parse a complete file into a collection with raw (unrepaired) points
    fn parse(&self, reader: &mut dyn BufRead) -> Result<TrackCollection>;
}

/// Extension-based lookup of format adapters
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn FormatAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the GPX and TCX adapters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(GpxAdapter);
        registry.register(TcxAdapter);
        registry
    }

    /// Add an adapter; earlier registrations win on conflicting extensions
    pub fn register(&mut self, adapter: impl FormatAdapter + 'static) {
        self.adapters.push(Arc::new(adapter));
    }

    /// Adapter for the extension of `path`, compared case-insensitively
    pub fn find(&self, path: &Path) -> Option<Arc<dyn FormatAdapter>> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        self.adapters
            .iter()
            .find(|adapter| adapter.extensions().contains(&extension.as_str()))
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let extensions: Vec<&str> = self
            .adapters
            .iter()
            .flat_map(|adapter| adapter.extensions().iter().copied())
            .collect();
        f.debug_struct("AdapterRegistry")
            .field("extensions", &extensions)
            .finish()
    }
}
