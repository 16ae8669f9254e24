//! Xref map container on top of the archive
//!
//! One archive holds a distinguished major map (`xrefmap.yml`) and any number
//! of minor maps. Byte storage is delegated to [`ArchiveContainer`] and map
//! (de)serialization to the injected [`XRefMapCodec`].

use crate::archive::ArchiveContainer;
use crate::codec::{self, XRefMapCodec, YamlCodec};
use crate::config::{ArchiveConfig, ArchiveMode};
use crate::container::{XRefContainer, XRefContainerReader};
use crate::error::{Result, XRefError};
use crate::reader::XRefArchiveReader;
use crate::validation::{self, MAJOR_ENTRY_NAME};
use crate::xref_map::{XRefMap, XRefMapRedirection};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Persistent, indexed container of xref maps
pub struct XRefArchive {
    container: Arc<ArchiveContainer>,
    codec: Arc<dyn XRefMapCodec>,
    config: ArchiveConfig,
    reader: OnceLock<Arc<XRefArchiveReader>>,
}

impl XRefArchive {
    /// Name of the major entry
    pub const MAJOR_FILE_NAME: &'static str = MAJOR_ENTRY_NAME;

    /// Open with the YAML codec and default configuration
    pub fn open<P: AsRef<Path>>(path: P, mode: ArchiveMode) -> Result<Self> {
        Self::open_with(path, mode, Arc::new(YamlCodec), ArchiveConfig::default())
    }

    /// Open with an explicit codec and configuration
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        mode: ArchiveMode,
        codec: Arc<dyn XRefMapCodec>,
        config: ArchiveConfig,
    ) -> Result<Self> {
        let container = ArchiveContainer::open(path, mode, &config)?;
        Ok(XRefArchive {
            container: Arc::new(container),
            codec,
            config,
            reader: OnceLock::new(),
        })
    }

    pub fn mode(&self) -> ArchiveMode {
        self.container.mode()
    }

    pub fn path(&self) -> &Path {
        self.container.path()
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        if self.mode().is_read_only() {
            return Err(XRefError::read_only(operation));
        }
        Ok(())
    }

    fn encode(&self, map: &XRefMap) -> Result<Vec<u8>> {
        codec::encode(self.codec.as_ref(), map)
    }

    /// Create the major entry
    ///
    /// # Errors
    ///
    /// `InvalidState` if the archive is read-only or already has a major entry.
    pub fn create_major(&self, map: &XRefMap) -> Result<String> {
        self.ensure_writable("create")?;
        let content = self.encode(map)?;
        self.container
            .create_entry(MAJOR_ENTRY_NAME, content)
            .map_err(|err| match err {
                XRefError::InvalidState(_) if self.container.has_entry(MAJOR_ENTRY_NAME) => {
                    XRefError::InvalidState("major entry already exists".to_string())
                }
                other => other,
            })
    }

    /// Create a minor entry and return its name
    ///
    /// Each hint is normalized in turn; the first one that is valid and not
    /// taken wins. Without a usable hint a random `<uuid>.yml` name is used.
    pub fn create_minor<I, S>(&self, map: &XRefMap, name_hints: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_writable("create")?;
        let content = self.encode(map)?;

        let candidates = name_hints
            .into_iter()
            .filter_map(|hint| validation::normalize_minor_name(hint.as_ref()));
        let name = self.container.create_unique_entry(
            candidates,
            validation::random_minor_name,
            content,
        )?;

        debug!("Created minor entry {}", name);
        Ok(name)
    }

    /// Decode the map stored under `name`
    pub fn get(&self, name: &str) -> Result<XRefMap> {
        let content = self.container.read_entry(name)?;
        codec::decode(self.codec.as_ref(), &content)
    }

    pub fn get_major(&self) -> Result<XRefMap> {
        self.get(MAJOR_ENTRY_NAME)
    }

    /// Replace the map stored under an existing name
    pub fn update(&self, name: &str, map: &XRefMap) -> Result<()> {
        validation::validate_entry_name(name)?;
        self.ensure_writable("update")?;
        let content = self.encode(map)?;
        self.container.update_entry(name, content)
    }

    pub fn update_major(&self, map: &XRefMap) -> Result<()> {
        self.update(MAJOR_ENTRY_NAME, map)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        self.container.delete_entry(name)
    }

    pub fn delete_major(&self) -> Result<()> {
        self.delete(MAJOR_ENTRY_NAME)
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.container.has_entry(name)
    }

    /// Snapshot of entry names, sorted case-insensitively
    pub fn entries(&self) -> Vec<String> {
        self.container.entries()
    }

    /// Shared read-only view, created on first use
    pub fn reader(&self) -> Arc<XRefArchiveReader> {
        Arc::clone(self.reader.get_or_init(|| {
            Arc::new(XRefArchiveReader::new(
                Arc::clone(&self.container),
                Arc::clone(&self.codec),
                self.config.reader_cache_capacity,
            ))
        }))
    }

    /// Write pending changes to disk
    pub fn flush(&self) -> Result<()> {
        self.container.flush()
    }

    /// Flush and release the archive file
    ///
    /// Readers obtained earlier fail with `InvalidState` afterwards.
    pub fn close(self) -> Result<()> {
        self.container.close()
    }
}

impl XRefContainer for XRefArchive {
    fn is_embedded_redirections(&self) -> bool {
        true
    }

    fn redirections(&self) -> Vec<XRefMapRedirection> {
        Vec::new()
    }

    fn reader(&self) -> Arc<dyn XRefContainerReader> {
        XRefArchive::reader(self)
    }
}
