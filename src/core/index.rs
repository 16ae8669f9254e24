//! Sorted in-memory index of archive entry names
//!
//! Entry names are ordered with an ordinal, case-insensitive collation: each
//! character is mapped to its single-character upper case and the resulting
//! sequences are compared by code point. Two names that differ only in case address the same entry.

use std::cmp::Ordering;

/// Upper-case a single character, keeping it unchanged when its upper-case
/// form is more than one character (`ß`, ligatures)
fn fold_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Case-folded key of an entry name; equal keys address the same entry
pub fn fold_case(name: &str) -> String {
    name.chars().map(fold_char).collect()
}

/// Ordinal, case-insensitive comparison of two entry names
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars().map(fold_char).cmp(b.chars().map(fold_char))
}

/// Ordered, deduplicated list of entry names
///
/// Invariant: `names` is sorted by [`compare_ignore_case`] and holds no two
/// names that compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerIndex {
    names: Vec<String>,
}

impl ContainerIndex {
    pub fn new() -> Self {
        ContainerIndex { names: Vec::new() }
    }

    /// Build an index from an arbitrary name list
    ///
    /// Later duplicates (by case-insensitive comparison) are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        // stable sort keeps the first spelling of a duplicate in front
        names.sort_by(|a, b| compare_ignore_case(a, b));
        names.dedup_by(|later, earlier| compare_ignore_case(later, earlier) == Ordering::Equal);
        ContainerIndex { names }
    }

    /// Binary search for `name`
    ///
    /// `Ok(slot)` if present, `Err(slot)` with the insertion point otherwise.
    pub fn position(&self, name: &str) -> std::result::Result<usize, usize> {
        self.names
            .binary_search_by(|probe| compare_ignore_case(probe, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_ok()
    }

    /// Stored spelling of `name`, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).ok().map(|slot| self.names[slot].as_str())
    }

    /// Insert `name` at its sorted position
    ///
    /// Returns false (and leaves the index unchanged) if it is already present.
    pub fn insert(&mut self, name: &str) -> bool {
        match self.position(name) {
            Ok(_) => false,
            Err(slot) => {
                self.names.insert(slot, name.to_string());
                true
            }
        }
    }

    /// Remove the name stored at `slot`
    pub fn remove_at(&mut self, slot: usize) -> String {
        self.names.remove(slot)
    }

    /// Remove `name`, returning its stored spelling
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).ok().map(|slot| self.remove_at(slot))
    }

    /// Name stored at `slot`
    pub fn name_at(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    /// Owned copy of the current names, in index order
    pub fn snapshot(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
