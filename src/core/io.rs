//! Disk I/O for xref archives
//!
//! The physical format is a plain zip file. In read mode entries are streamed
//! from the file on demand. In update and create mode the entry set is staged
//! in memory and the whole zip is rewritten on [`ArchiveFile::flush`].
//! The rewrite goes to a temporary file in the same directory which then
//! replaces the archive, so a failed flush leaves the previous file intact.

use crate::config::{ArchiveMode, EntryCompression};
use crate::error::{Result, XRefError};
use crate::index::fold_case;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Upper bound on the buffer reserved up front for an entry; the size
/// recorded in the zip is untrusted
const MAX_PREALLOCATED_ENTRY: u64 = 64 * 1024;

fn read_all<R: Read>(entry: &mut R, declared_size: u64) -> Result<Vec<u8>> {
    let mut content = Vec::with_capacity(declared_size.min(MAX_PREALLOCATED_ENTRY) as usize);
    entry.read_to_end(&mut content)?;
    Ok(content)
}

enum Storage {
    Reader(ZipArchive<File>),
    Staged {
        file: File,
        entries: BTreeMap<String, Vec<u8>>,
        dirty: bool,
    },
}

/// Disk-backed zip storage
pub struct ArchiveFile {
    storage: Storage,
    path: PathBuf,
    compression: EntryCompression,
}

impl ArchiveFile {
    /// Open or create the zip file at `path`
    ///
    /// Read and update modes fail with `NotFound` if the file is missing.
    /// Create mode creates missing parent directories and truncates any
    /// existing file. Handles acquired before a failure are dropped before
    /// the error is returned.
    pub fn open<P: AsRef<Path>>(
        path: P,
        mode: ArchiveMode,
        compression: EntryCompression,
    ) -> Result<Self> {
        let path = path.as_ref();

        let storage = match mode {
            ArchiveMode::Read => {
                let file = Self::open_existing(path, false)?;
                Storage::Reader(ZipArchive::new(file)?)
            }
            ArchiveMode::Update => {
                let file = Self::open_existing(path, true)?;
                let entries = Self::load_entries(&file)?;
                Storage::Staged {
                    file,
                    entries,
                    dirty: false,
                }
            }
            ArchiveMode::Create => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                // an empty archive still has to be written out as a valid zip
                Storage::Staged {
                    file,
                    entries: BTreeMap::new(),
                    dirty: true,
                }
            }
        };

        Ok(ArchiveFile {
            storage,
            path: path.to_path_buf(),
            compression,
        })
    }

    fn open_existing(path: &Path, writable: bool) -> Result<File> {
        if !path.is_file() {
            return Err(XRefError::NotFound(format!(
                "archive file not found: {}",
                path.display()
            )));
        }
        Ok(OpenOptions::new().read(true).write(writable).open(path)?)
    }

    /// Read every entry of the zip file into memory
    fn load_entries(file: &File) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut archive = ZipArchive::new(file)?;
        let mut entries = BTreeMap::new();
        let mut seen = HashSet::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            // names are case-insensitive; the first spelling wins
            if !seen.insert(fold_case(entry.name())) {
                debug!("Skipping duplicate entry {}", entry.name());
                continue;
            }
            let size = entry.size();
            let content = read_all(&mut entry, size)?;
            entries.insert(entry.name().to_string(), content);
        }

        debug!("Loaded {} entries into memory", entries.len());
        Ok(entries)
    }

    /// Names of all file entries, in storage order
    pub fn entry_names(&self) -> Vec<String> {
        match &self.storage {
            Storage::Reader(archive) => archive
                .file_names()
                .filter(|name| !name.ends_with('/'))
                .map(str::to_string)
                .collect(),
            Storage::Staged { entries, .. } => entries.keys().cloned().collect(),
        }
    }

    /// Read the full content of an entry
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        match &mut self.storage {
            Storage::Reader(archive) => {
                let mut entry = archive.by_name(name).map_err(|err| match err {
                    zip::result::ZipError::FileNotFound => XRefError::entry_not_found(name),
                    other => XRefError::Zip(other),
                })?;
                let size = entry.size();
                read_all(&mut entry, size)
            }
            Storage::Staged { entries, .. } => entries
                .get(name)
                .cloned()
                .ok_or_else(|| XRefError::entry_not_found(name)),
        }
    }

    /// Create or replace an entry
    pub fn write_entry(&mut self, name: &str, content: Vec<u8>) -> Result<()> {
        match &mut self.storage {
            Storage::Reader(_) => Err(XRefError::read_only("write")),
            Storage::Staged { entries, dirty, .. } => {
                entries.insert(name.to_string(), content);
                *dirty = true;
                Ok(())
            }
        }
    }

    /// Remove an entry
    pub fn remove_entry(&mut self, name: &str) -> Result<()> {
        match &mut self.storage {
            Storage::Reader(_) => Err(XRefError::read_only("delete")),
            Storage::Staged { entries, dirty, .. } => {
                entries
                    .remove(name)
                    .ok_or_else(|| XRefError::entry_not_found(name))?;
                *dirty = true;
                Ok(())
            }
        }
    }

    fn file_options(&self) -> SimpleFileOptions {
        match self.compression {
            EntryCompression::Stored => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
            }
            EntryCompression::Deflated { level } => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(level),
        }
    }

    /// Rewrite the zip file from the staged entries
    ///
    /// No-op in read mode or when nothing changed since the last flush. On
    /// failure the file on disk is unchanged and the entries stay dirty.
    pub fn flush(&mut self) -> Result<()> {
        let options = self.file_options();

        let Storage::Staged {
            file,
            entries,
            dirty,
        } = &mut self.storage
        else {
            return Ok(());
        };
        if !*dirty {
            return Ok(());
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // dropping the temp file on an early return removes it
        let mut staged = NamedTempFile::new_in(dir)?;
        fs::set_permissions(staged.path(), file.metadata()?.permissions())?;

        let mut writer = ZipWriter::new(staged.as_file_mut());
        for (name, content) in entries.iter() {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(content)?;
        }
        writer.finish()?;

        staged.as_file_mut().flush()?;
        staged.as_file().sync_all()?;
        *file = staged.persist(&self.path).map_err(io::Error::from)?;
        *dirty = false;

        debug!("Wrote {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    /// True if staged changes have not been flushed yet
    pub fn is_dirty(&self) -> bool {
        matches!(self.storage, Storage::Staged { dirty: true, .. })
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
