//! Read-only, caching view over an xref archive
//!
//! Lookups start at the major entry and follow redirections to other entries
//! of the same archive. Decoded maps are cached until the archive changes.

use crate::archive::ArchiveContainer;
use crate::codec::{self, XRefMapCodec};
use crate::container::XRefContainerReader;
use crate::error::Result;
use crate::validation::MAJOR_ENTRY_NAME;
use crate::xref_map::{XRefMap, XRefSpec};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Decoded maps keyed by stored entry name, valid for one archive generation
struct MapCache {
    generation: u64,
    maps: LruCache<String, Arc<XRefMap>>,
}

/// Name→map and uid→spec resolution for an xref archive
pub struct XRefArchiveReader {
    container: Arc<ArchiveContainer>,
    codec: Arc<dyn XRefMapCodec>,
    cache: Mutex<MapCache>,
}

impl XRefArchiveReader {
    pub(crate) fn new(
        container: Arc<ArchiveContainer>,
        codec: Arc<dyn XRefMapCodec>,
        cache_capacity: NonZeroUsize,
    ) -> Self {
        let generation = container.generation();
        XRefArchiveReader {
            container,
            codec,
            cache: Mutex::new(MapCache {
                generation,
                maps: LruCache::new(cache_capacity),
            }),
        }
    }

    /// Cached map for a stored name, dropping everything from older generations
    fn cached(&self, stored: &str, generation: u64) -> Option<Arc<XRefMap>> {
        let mut cache = self.cache.lock();
        if cache.generation != generation {
            cache.maps.clear();
            cache.generation = generation;
            return None;
        }
        cache.maps.get(stored).cloned()
    }

    fn remember(&self, stored: String, map: Arc<XRefMap>, generation: u64) {
        let mut cache = self.cache.lock();
        // a mutation may have landed since the bytes were read
        if cache.generation == generation {
            cache.maps.put(stored, map);
        }
    }

    /// Decoded map stored under `name` (case-insensitive)
    ///
    /// Fails with `NotFound` if there is no such entry.
    pub fn map(&self, name: &str) -> Result<Arc<XRefMap>> {
        let generation = self.container.generation();
        let stored = self
            .container
            .resolve(name)
            .ok_or_else(|| crate::error::XRefError::entry_not_found(name))?;

        if let Some(map) = self.cached(&stored, generation) {
            return Ok(map);
        }

        let content = self.container.read_entry(&stored)?;
        let map = Arc::new(codec::decode(self.codec.as_ref(), &content)?);
        self.remember(stored, Arc::clone(&map), generation);
        Ok(map)
    }

    /// Number of decoded maps currently cached
    pub fn cached_maps(&self) -> usize {
        self.cache.lock().maps.len()
    }
}

impl XRefContainerReader for XRefArchiveReader {
    fn find(&self, uid: &str) -> Result<Option<XRefSpec>> {
        let mut visited = HashSet::new();
        let mut pending = vec![MAJOR_ENTRY_NAME.to_string()];

        while let Some(name) = pending.pop() {
            let Some(stored) = self.container.resolve(&name) else {
                debug!("Redirection target {} is not in the archive", name);
                continue;
            };
            if !visited.insert(stored.clone()) {
                continue;
            }

            let map = self.map(&stored)?;
            if let Some(spec) = map.find(uid) {
                return Ok(Some(spec.clone()));
            }

            // pushed in reverse so redirections are followed in declared order
            pending.extend(
                map.redirections
                    .iter()
                    .rev()
                    .filter(|redirection| uid.starts_with(redirection.uid_prefix.as_str()))
                    .map(|redirection| redirection.href.clone()),
            );
        }

        Ok(None)
    }
}
