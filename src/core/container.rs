//! Consumer-facing surfaces for anything that holds xref maps

use crate::error::Result;
use crate::xref_map::{XRefMap, XRefMapRedirection, XRefSpec};
use std::sync::Arc;

/// Resolves uids to xref specs without exposing how maps are stored
pub trait XRefContainerReader: Send + Sync {
    fn find(&self, uid: &str) -> Result<Option<XRefSpec>>;
}

/// Read-only view of a source of xref maps
pub trait XRefContainer {
    /// True if redirections are resolved inside the container itself
    fn is_embedded_redirections(&self) -> bool;

    /// Redirections the caller has to follow on its own
    fn redirections(&self) -> Vec<XRefMapRedirection>;

    fn reader(&self) -> Arc<dyn XRefContainerReader>;
}

/// Reader over a single in-memory map
pub struct BasicXRefMapReader {
    map: XRefMap,
}

impl BasicXRefMapReader {
    pub fn new(map: XRefMap) -> Self {
        BasicXRefMapReader { map }
    }
}

impl XRefContainerReader for BasicXRefMapReader {
    fn find(&self, uid: &str) -> Result<Option<XRefSpec>> {
        Ok(self.map.find(uid).cloned())
    }
}

impl XRefContainer for XRefMap {
    fn is_embedded_redirections(&self) -> bool {
        false
    }

    fn redirections(&self) -> Vec<XRefMapRedirection> {
        self.redirections.clone()
    }

    fn reader(&self) -> Arc<dyn XRefContainerReader> {
        Arc::new(BasicXRefMapReader::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_as_container() {
        let mut map = XRefMap::from_references(vec![XRefSpec::new("A", "a.html")]);
        map.redirections
            .push(XRefMapRedirection::new("B", "b/xrefmap.yml"));

        assert!(!map.is_embedded_redirections());
        assert_eq!(map.redirections().len(), 1);

        let reader = map.reader();
        assert_eq!(
            reader.find("A").unwrap().and_then(|spec| spec.href),
            Some("a.html".to_string())
        );
        assert!(reader.find("B.Thing").unwrap().is_none());
    }
}
