//! Cross-reference map model
//!
//! The archive core treats maps as opaque values handed to a codec. The model
//! here is what the bundled codecs and readers understand.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A resolvable cross-reference: a uid and where it points to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XRefSpec {
    pub uid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    /// Any other properties (fullName, commentId, ...)
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl XRefSpec {
    pub fn new(uid: impl Into<String>, href: impl Into<String>) -> Self {
        XRefSpec {
            uid: uid.into(),
            href: Some(href.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Hint that uids starting with `uid_prefix` live in the map at `href`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XRefMapRedirection {
    pub uid_prefix: String,
    pub href: String,
}

impl XRefMapRedirection {
    pub fn new(uid_prefix: impl Into<String>, href: impl Into<String>) -> Self {
        XRefMapRedirection {
            uid_prefix: uid_prefix.into(),
            href: href.into(),
        }
    }
}

/// A set of cross-reference records plus optional redirections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XRefMap {
    /// True if `references` is ordered by uid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorted: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href_updated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirections: Vec<XRefMapRedirection>,

    #[serde(default)]
    pub references: Vec<XRefSpec>,

    #[serde(flatten)]
    pub others: BTreeMap<String, Value>,
}

impl XRefMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_references(references: Vec<XRefSpec>) -> Self {
        XRefMap {
            references,
            ..Default::default()
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted == Some(true)
    }

    /// Order references by uid (ordinal) and mark the map sorted
    pub fn sort(&mut self) {
        self.references.sort_by(|a, b| a.uid.cmp(&b.uid));
        self.sorted = Some(true);
    }

    /// Look up a reference by uid
    ///
    /// Binary search when the map is marked sorted, linear scan otherwise.
    pub fn find(&self, uid: &str) -> Option<&XRefSpec> {
        if self.is_sorted() {
            self.references
                .binary_search_by(|spec| spec.uid.as_str().cmp(uid))
                .ok()
                .map(|idx| &self.references[idx])
        } else {
            self.references.iter().find(|spec| spec.uid == uid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> XRefMap {
        XRefMap::from_references(vec![
            XRefSpec::new("System.String", "string.html"),
            XRefSpec::new("System.Int32", "int32.html").with_name("Int32"),
            XRefSpec::new("System.Boolean", "boolean.html"),
        ])
    }

    #[test]
    fn test_find_unsorted() {
        let map = sample();
        assert!(!map.is_sorted());
        assert_eq!(
            map.find("System.Int32").and_then(|s| s.name.as_deref()),
            Some("Int32")
        );
        assert!(map.find("System.Missing").is_none());
    }

    #[test]
    fn test_sort_then_find() {
        let mut map = sample();
        map.sort();
        assert!(map.is_sorted());
        let uids: Vec<_> = map.references.iter().map(|s| s.uid.as_str()).collect();
        assert_eq!(uids, vec!["System.Boolean", "System.Int32", "System.String"]);
        assert_eq!(
            map.find("System.String").and_then(|s| s.href.as_deref()),
            Some("string.html")
        );
        assert!(map.find("System.Char").is_none());
    }

    #[test]
    fn test_extension_properties_survive_json() {
        let json = r#"{
            "baseUrl": "https://docs.example.com/",
            "references": [
                {"uid": "A", "href": "a.html", "fullName": "Namespace.A"}
            ],
            "customKey": 42
        }"#;
        let map: XRefMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.base_url.as_deref(), Some("https://docs.example.com/"));
        assert_eq!(
            map.references[0].properties.get("fullName"),
            Some(&Value::String("Namespace.A".to_string()))
        );
        assert_eq!(map.others.get("customKey"), Some(&Value::from(42)));
    }
}
