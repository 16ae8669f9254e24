//! Open modes and tunables for xref archives

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// How an archive file is opened
///
/// Fixed for the lifetime of the container; decides whether mutating
/// operations are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveMode {
    /// Existing file, read only
    Read,
    /// Existing file, read and write
    Update,
    /// New file (truncated if present), read and write
    Create,
}

impl ArchiveMode {
    pub fn is_read_only(self) -> bool {
        matches!(self, ArchiveMode::Read)
    }
}

/// Compression applied to entries when the archive is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum EntryCompression {
    Stored,
    Deflated {
        #[serde(default)]
        level: Option<i64>,
    },
}

impl Default for EntryCompression {
    fn default() -> Self {
        EntryCompression::Deflated { level: None }
    }
}

/// Archive configuration
///
/// # Examples
///
/// ```
/// use xref_archive::ArchiveConfig;
///
/// let config = ArchiveConfig::from_toml_str(
///     r#"
///     reader_cache_capacity = 8
///
///     [compression]
///     method = "stored"
///     "#,
/// ).unwrap();
/// assert_eq!(config.reader_cache_capacity.get(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Entry compression for newly written entries
    pub compression: EntryCompression,

    /// Number of decoded maps kept by the archive reader
    pub reader_cache_capacity: NonZeroUsize,
}

impl ArchiveConfig {
    const DEFAULT_READER_CACHE: usize = 64;

    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            compression: EntryCompression::default(),
            reader_cache_capacity: NonZeroUsize::new(Self::DEFAULT_READER_CACHE)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}
