//! Validation and normalization for archive entry names
//!
//! Entry names double as file names when an archive is unpacked, so they are
//! held to file-name rules. Minor entries always carry a YAML extension.

use crate::error::{Result, XRefError};
use uuid::Uuid;

/// Reserved name of the major entry
pub const MAJOR_ENTRY_NAME: &str = "xrefmap.yml";

/// Canonical extension for map entries
pub const MAP_EXTENSION: &str = ".yml";

/// Alternative extension accepted as-is
const ALT_MAP_EXTENSION: &str = ".yaml";

/// Characters never allowed in an entry name
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Returns true if `c` can't appear in a file name
fn is_invalid_name_char(c: char) -> bool {
    c.is_control() || INVALID_NAME_CHARS.contains(&c)
}

/// Check that an entry name can be used to address an entry
///
/// # Errors
///
/// Returns `InvalidArgument` for empty or all-whitespace names.
pub fn validate_entry_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(XRefError::InvalidArgument(
            "entry name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Extension of `name` including the leading dot, if any
fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => Some(&name[idx..]),
        _ => None,
    }
}

/// Normalize a caller-supplied minor entry name
///
/// Returns `None` when the hint is blank or contains characters that are
/// invalid in file names. Otherwise returns the hint, with `.yml` appended
/// unless it already ends in `.yml` or `.yaml` (case-insensitive).
///
/// # Examples
///
/// ```
/// use xref_archive::validation::normalize_minor_name;
///
/// assert_eq!(normalize_minor_name("api").as_deref(), Some("api.yml"));
/// assert_eq!(normalize_minor_name("api.YAML").as_deref(), Some("api.YAML"));
/// assert_eq!(normalize_minor_name("api.json").as_deref(), Some("api.json.yml"));
/// assert_eq!(normalize_minor_name("a/b.yml"), None);
/// ```
pub fn normalize_minor_name(hint: &str) -> Option<String> {
    if hint.trim().is_empty() || hint.chars().any(is_invalid_name_char) {
        return None;
    }

    let has_map_extension = extension(hint).is_some_and(|ext| {
        ext.eq_ignore_ascii_case(MAP_EXTENSION) || ext.eq_ignore_ascii_case(ALT_MAP_EXTENSION)
    });

    if has_map_extension {
        Some(hint.to_string())
    } else {
        Some(format!("{}{}", hint, MAP_EXTENSION))
    }
}

/// Generate a fresh minor entry name: a random v4 UUID plus `.yml`
pub fn random_minor_name() -> String {
    format!("{}{}", Uuid::new_v4(), MAP_EXTENSION)
}
