//! Serialization of xref maps to and from entry content
//!
//! The container never looks inside a map; it hands whole maps to an
//! [`XRefMapCodec`] injected at open time.

use crate::error::Result;
use crate::xref_map::XRefMap;
use std::io::{Read, Write};

/// Format tag written for xref map entries
pub const XREF_MAP_MIME: &str = "XRefMap";

/// Converts between stored entry bytes and [`XRefMap`] values
pub trait XRefMapCodec: Send + Sync {
    /// Write `map` to `writer`, tagged with the format tag `mime`
    fn serialize(&self, writer: &mut dyn Write, map: &XRefMap, mime: &str) -> Result<()>;

    /// Read one map from `reader`
    fn deserialize(&self, reader: &mut dyn Read) -> Result<XRefMap>;
}

/// YAML codec; the first line of every entry is a `### YamlMime:<tag>` comment
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl XRefMapCodec for YamlCodec {
    fn serialize(&self, writer: &mut dyn Write, map: &XRefMap, mime: &str) -> Result<()> {
        writeln!(writer, "### YamlMime:{}", mime)?;
        serde_yaml::to_writer(&mut *writer, map)?;
        writer.flush()?;
        Ok(())
    }

    fn deserialize(&self, reader: &mut dyn Read) -> Result<XRefMap> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// JSON codec; the format tag is not recorded
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl XRefMapCodec for JsonCodec {
    fn serialize(&self, writer: &mut dyn Write, map: &XRefMap, _mime: &str) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, map)?;
        writer.flush()?;
        Ok(())
    }

    fn deserialize(&self, reader: &mut dyn Read) -> Result<XRefMap> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Encode `map` into a fresh buffer
pub(crate) fn encode(codec: &dyn XRefMapCodec, map: &XRefMap) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    codec.serialize(&mut buffer, map, XREF_MAP_MIME)?;
    Ok(buffer)
}

/// Decode a map from stored bytes
pub(crate) fn decode(codec: &dyn XRefMapCodec, content: &[u8]) -> Result<XRefMap> {
    let mut reader = content;
    codec.deserialize(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xref_map::{XRefMapRedirection, XRefSpec};

    fn sample() -> XRefMap {
        let mut map = XRefMap::from_references(vec![
            XRefSpec::new("N.A", "a.html").with_name("A"),
            XRefSpec::new("N.B", "b.html"),
        ]);
        map.redirections
            .push(XRefMapRedirection::new("Other.", "other.yml"));
        map.base_url = Some("https://example.com/".to_string());
        map.sort();
        map
    }

    #[test]
    fn test_yaml_header_line() {
        let bytes = encode(&YamlCodec, &sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("### YamlMime:XRefMap\n"));
        assert!(text.contains("uidPrefix: Other."));
    }

    #[test]
    fn test_yaml_round_trip() {
        let map = sample();
        let bytes = encode(&YamlCodec, &map).unwrap();
        assert_eq!(decode(&YamlCodec, &bytes).unwrap(), map);
    }

    #[test]
    fn test_json_round_trip() {
        let map = sample();
        let bytes = encode(&JsonCodec, &map).unwrap();
        assert_eq!(decode(&JsonCodec, &bytes).unwrap(), map);
    }

    #[test]
    fn test_yaml_decode_error() {
        let result = decode(&YamlCodec, b"references: [unterminated");
        assert!(matches!(result, Err(crate::error::XRefError::Yaml(_))));
    }
}
