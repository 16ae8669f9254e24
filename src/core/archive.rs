//! Lock-guarded archive container
//!
//! Pairs the physical zip storage with the sorted entry index. Every public
//! operation takes the one container lock, so the index check and the
//! physical action it guards are atomic with respect to other callers and
//! the index never diverges from the stored entry set.

use crate::config::{ArchiveConfig, ArchiveMode};
use crate::error::{Result, XRefError};
use crate::index::ContainerIndex;
use crate::io::ArchiveFile;
use crate::validation;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Index and storage, guarded together
struct ArchiveState {
    index: ContainerIndex,
    /// `None` once the container is closed
    file: Option<ArchiveFile>,
}

impl ArchiveState {
    fn file(&mut self) -> Result<&mut ArchiveFile> {
        self.file
            .as_mut()
            .ok_or_else(|| XRefError::InvalidState("archive is closed".to_string()))
    }
}

/// Named byte-content entries stored in a zip file
pub struct ArchiveContainer {
    mode: ArchiveMode,
    path: PathBuf,
    state: Mutex<ArchiveState>,
    /// Bumped after every successful mutation
    generation: AtomicU64,
}

impl ArchiveContainer {
    /// Open the archive at `path`
    ///
    /// Read and update modes load the existing entry names into the index;
    /// create mode starts empty.
    pub fn open<P: AsRef<Path>>(path: P, mode: ArchiveMode, config: &ArchiveConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening archive {:?} in {:?} mode", path, mode);

        let file = ArchiveFile::open(path, mode, config.compression)?;
        let index = ContainerIndex::from_names(file.entry_names());
        debug!("Archive {:?} has {} entries", path, index.len());

        Ok(ArchiveContainer {
            mode,
            path: path.to_path_buf(),
            state: Mutex::new(ArchiveState {
                index,
                file: Some(file),
            }),
            generation: AtomicU64::new(0),
        })
    }

    pub fn mode(&self) -> ArchiveMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutation counter; changes whenever an entry is created, updated or deleted
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn touch(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        if self.mode.is_read_only() {
            return Err(XRefError::read_only(operation));
        }
        Ok(())
    }

    /// True if an entry with this name exists (case-insensitive)
    pub fn has_entry(&self, name: &str) -> bool {
        self.state.lock().index.contains(name)
    }

    /// Stored spelling of `name`, if present
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.state.lock().index.get(name).map(str::to_string)
    }

    /// Snapshot of all entry names, sorted case-insensitively
    pub fn entries(&self) -> Vec<String> {
        self.state.lock().index.snapshot()
    }

    /// Create a new entry
    ///
    /// # Errors
    ///
    /// `InvalidState` if the archive is read-only or the entry already exists.
    pub fn create_entry(&self, name: &str, content: Vec<u8>) -> Result<String> {
        validation::validate_entry_name(name)?;
        self.ensure_writable("create")?;

        let mut state = self.state.lock();
        if state.index.contains(name) {
            return Err(XRefError::InvalidState(format!(
                "entry '{}' already exists",
                name
            )));
        }
        Self::create_locked(&mut state, name, content)?;
        self.touch();
        Ok(name.to_string())
    }

    /// Create an entry under the first unused name
    ///
    /// Candidates are tried in order; once they run out, `fallback` is called
    /// until it yields an unused name.
    pub fn create_unique_entry<I, F>(
        &self,
        candidates: I,
        mut fallback: F,
        content: Vec<u8>,
    ) -> Result<String>
    where
        I: IntoIterator<Item = String>,
        F: FnMut() -> String,
    {
        self.ensure_writable("create")?;

        let mut state = self.state.lock();
        let name = match candidates
            .into_iter()
            .find(|name| !state.index.contains(name))
        {
            Some(name) => name,
            None => loop {
                let name = fallback();
                if !state.index.contains(&name) {
                    break name;
                }
            },
        };
        Self::create_locked(&mut state, &name, content)?;
        self.touch();
        Ok(name)
    }

    /// Physical write first, then the index slot, so a failed write leaves
    /// both untouched
    fn create_locked(state: &mut ArchiveState, name: &str, content: Vec<u8>) -> Result<()> {
        debug!("Creating entry {} ({} bytes)", name, content.len());
        state.file()?.write_entry(name, content)?;
        state.index.insert(name);
        Ok(())
    }

    /// Read the content of an entry
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        validation::validate_entry_name(name)?;

        let mut state = self.state.lock();
        let stored = state
            .index
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| XRefError::entry_not_found(name))?;
        debug!("Reading entry {}", stored);
        state.file()?.read_entry(&stored)
    }

    /// Replace the content of an existing entry
    ///
    /// The physical entry is removed and recreated under its stored name;
    /// its index slot does not move.
    pub fn update_entry(&self, name: &str, content: Vec<u8>) -> Result<()> {
        validation::validate_entry_name(name)?;
        self.ensure_writable("update")?;

        let mut state = self.state.lock();
        let stored = state
            .index
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| XRefError::entry_not_found(name))?;
        debug!("Updating entry {} ({} bytes)", stored, content.len());

        let file = state.file()?;
        file.remove_entry(&stored)?;
        file.write_entry(&stored, content)?;
        self.touch();
        Ok(())
    }

    /// Delete an entry
    pub fn delete_entry(&self, name: &str) -> Result<()> {
        validation::validate_entry_name(name)?;
        self.ensure_writable("delete")?;

        let mut state = self.state.lock();
        let slot = state
            .index
            .position(name)
            .map_err(|_| XRefError::entry_not_found(name))?;
        let stored = state
            .index
            .name_at(slot)
            .map(str::to_string)
            .ok_or_else(|| XRefError::entry_not_found(name))?;
        debug!("Deleting entry {}", stored);

        state.file()?.remove_entry(&stored)?;
        state.index.remove_at(slot);
        self.touch();
        Ok(())
    }

    /// Persist pending changes without closing
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    /// Flush pending changes and release the file handle
    ///
    /// Later operations fail with `InvalidState`. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let file = self.state.lock().file.take();
        match file {
            Some(mut file) => {
                info!("Closing archive {:?}", self.path);
                file.flush()
            }
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().file.is_none()
    }
}

impl Drop for ArchiveContainer {
    fn drop(&mut self) {
        if let Some(mut file) = self.state.get_mut().file.take() {
            if let Err(err) = file.flush() {
                warn!("Failed to flush archive {:?} on drop: {}", self.path, err);
            }
        }
    }
}
