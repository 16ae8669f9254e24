//! # xref-archive - Cross-Reference Map Archives
//!
//! `xref-archive` stores cross-reference maps (uid → documentation target
//! mappings) in a single zip file so separately built documentation sets can
//! resolve links into each other. It also ships the bounded resource pool the
//! documentation tooling uses wherever workers share expensive objects.
//!
//! - **Indexed archive**: sorted, case-insensitive entry index kept in
//!   lockstep with the zip contents under one lock per archive
//! - **Major / minor maps**: one well-known `xrefmap.yml` plus any number of
//!   named or generated minor maps
//! - **Pluggable codec**: YAML by default, JSON available, or bring your own
//! - **Lazy reader**: memoized, caching view that follows redirections
//! - **Resource pool**: lazy construction, LIFO reuse, blocking rent
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xref_archive::{ArchiveMode, Result, XRefArchive, XRefContainerReader, XRefMap, XRefSpec};
//!
//! # fn main() -> Result<()> {
//! let archive = XRefArchive::open("_site/xrefmap.zip", ArchiveMode::Create)?;
//!
//! let map = XRefMap::from_references(vec![XRefSpec::new("System.String", "api/System.String.html")]);
//! archive.create_major(&map)?;
//! let minor = archive.create_minor(&map, ["system"])?;
//! assert_eq!(minor, "system.yml");
//!
//! let spec = archive.reader().find("System.String")?;
//! assert!(spec.is_some());
//!
//! archive.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Resource Pool
//!
//! ```rust
//! use xref_archive::ResourcePool;
//!
//! # fn main() -> xref_archive::Result<()> {
//! let pool = ResourcePool::new(|| Ok(String::with_capacity(1024)), 4)?;
//!
//! let mut buffer = pool.rent()?;
//! buffer.push_str("scratch");
//! buffer.release();
//!
//! assert_eq!(pool.stats().created, 1);
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules so crate:: paths in core resolve
pub use crate::core::{
    archive, codec, config, container, error, index, io, pool, reader, validation, xref_archive,
    xref_map,
};

pub use crate::core::{
    archive::ArchiveContainer,
    codec::{JsonCodec, XRefMapCodec, YamlCodec, XREF_MAP_MIME},
    config::{ArchiveConfig, ArchiveMode, EntryCompression},
    container::{BasicXRefMapReader, XRefContainer, XRefContainerReader},
    error::{BoxError, Result, XRefError},
    index::ContainerIndex,
    pool::{Lease, PoolStats, ResourcePool},
    reader::XRefArchiveReader,
    validation::{MAJOR_ENTRY_NAME, MAP_EXTENSION},
    xref_archive::XRefArchive,
    xref_map::{XRefMap, XRefMapRedirection, XRefSpec},
};

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builder for opening an [`XRefArchive`] with non-default settings
///
/// # Examples
///
/// ```rust,no_run
/// use xref_archive::{ArchiveMode, EntryCompression, JsonCodec, XRefArchiveBuilder};
///
/// # fn main() -> xref_archive::Result<()> {
/// let archive = XRefArchiveBuilder::new()
///     .mode(ArchiveMode::Update)
///     .codec(JsonCodec)
///     .compression(EntryCompression::Stored)
///     .open("obj/xref/maps.zip")?;
/// # Ok(())
/// # }
/// ```
pub struct XRefArchiveBuilder {
    mode: ArchiveMode,
    codec: Arc<dyn XRefMapCodec>,
    config: ArchiveConfig,
}

impl XRefArchiveBuilder {
    /// Create a builder: read mode, YAML codec, default configuration
    pub fn new() -> Self {
        XRefArchiveBuilder {
            mode: ArchiveMode::Read,
            codec: Arc::new(YamlCodec),
            config: ArchiveConfig::default(),
        }
    }

    pub fn mode(mut self, mode: ArchiveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the codec used for every entry
    pub fn codec<C: XRefMapCodec + 'static>(mut self, codec: C) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Use a codec shared with other archives
    pub fn shared_codec(mut self, codec: Arc<dyn XRefMapCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ArchiveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn compression(mut self, compression: EntryCompression) -> Self {
        self.config.compression = compression;
        self
    }

    pub fn reader_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.config.reader_cache_capacity = capacity;
        self
    }

    /// Open the archive at `path`
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<XRefArchive> {
        info!(
            "Building xref archive at {:?} ({:?} mode)",
            path.as_ref(),
            self.mode
        );
        XRefArchive::open_with(path, self.mode, self.codec, self.config)
    }
}

impl Default for XRefArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() -> Result<()> {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("maps.zip");

        let archive = XRefArchiveBuilder::new()
            .mode(ArchiveMode::Create)
            .open(&path)?;
        assert_eq!(archive.mode(), ArchiveMode::Create);
        assert_eq!(archive.config(), &ArchiveConfig::default());
        archive.close()?;

        let archive = XRefArchiveBuilder::default().open(&path)?;
        assert_eq!(archive.mode(), ArchiveMode::Read);
        assert!(archive.entries().is_empty());

        Ok(())
    }

    #[test]
    fn test_builder_with_json_and_stored() -> Result<()> {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("maps.zip");

        let archive = XRefArchiveBuilder::new()
            .mode(ArchiveMode::Create)
            .codec(JsonCodec)
            .compression(EntryCompression::Stored)
            .reader_cache_capacity(NonZeroUsize::new(2).unwrap())
            .open(&path)?;

        let map = XRefMap::from_references(vec![XRefSpec::new("A", "a.html")]);
        archive.create_major(&map)?;
        archive.close()?;

        let archive = XRefArchiveBuilder::new().codec(JsonCodec).open(&path)?;
        assert_eq!(archive.get_major()?, map);

        // the YAML codec reads JSON content too, since JSON is valid YAML
        let archive = XRefArchiveBuilder::new().open(&path)?;
        assert_eq!(archive.get_major()?, map);

        Ok(())
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let result = XRefArchiveBuilder::new().open(temp_dir.path().join("nope.zip"));
        assert!(matches!(result, Err(XRefError::NotFound(_))));
    }
}
