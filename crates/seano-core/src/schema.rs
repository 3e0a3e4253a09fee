//! Schema normalization for user-authored documents
//!
//! Configuration files and note files accept a number of convenience shapes:
//! a bare string where a list is expected, a string where an ancestry entry
//! mapping is expected, hierarchical lists where flat rich text is expected.
//! Everything here rewrites those shapes into a single canonical form so the
//! rest of the engine only ever sees one schema. Normalization is idempotent.

use serde_yaml::{Mapping, Value};

use crate::constants::{is_ancestry_key, is_set_like_key, RICH_TEXT_SUFFIX};
use crate::error::{Result, SchemaError};

/// Human-readable rendition of a value for error messages.
pub fn describe_value(value: &Value) -> String {
    match serde_yaml::to_string(value) {
        Ok(text) => format!("{} ({})", kind_of(value), text.trim()),
        Err(_) => kind_of(value).to_string(),
    }
}

/// The kind of a value, as used in merge and shape diagnostics.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Normalize a whole configuration document.
///
/// A null document (an empty YAML file) is an empty mapping.
pub fn normalize_root(value: Value) -> Result<Mapping> {
    let root = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(m) => m,
        other => return Err(SchemaError::unsupported("a mapping at the document root", &other).into()),
    };
    let mut out = Mapping::new();
    for (key, value) in root {
        let normalized = match key.as_str() {
            Some("parent_versions") => normalize_ancestry_container(value)?,
            Some("releases") => normalize_release_container(value)?,
            _ => value,
        };
        out.insert(key, normalized);
    }
    Ok(out)
}

/// Normalize an ancestry container (`parent_versions`, `before`, `after`)
/// into a list of `{name: ...}` mappings.
pub fn normalize_ancestry_container(value: Value) -> Result<Value> {
    let entries = match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![normalize_ancestry_entry(Value::String(s))?],
        Value::Sequence(items) => items
            .into_iter()
            .map(normalize_ancestry_entry)
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(SchemaError::unsupported("an ancestry container (string or list)", &other).into())
        }
    };
    Ok(Value::Sequence(entries))
}

fn normalize_ancestry_entry(value: Value) -> Result<Value> {
    match value {
        Value::String(name) => {
            let mut entry = Mapping::new();
            entry.insert(Value::String("name".into()), Value::String(name));
            Ok(Value::Mapping(entry))
        }
        Value::Mapping(entry) => {
            match entry.get("name") {
                Some(Value::String(_)) => Ok(Value::Mapping(entry)),
                Some(other) => Err(SchemaError::AncestryName(describe_value(other)).into()),
                None => Err(SchemaError::AncestryName("no name at all".into()).into()),
            }
        }
        other => Err(SchemaError::unsupported("an ancestry entry (string or mapping)", &other).into()),
    }
}

/// Normalize the top-level `releases` list. Entries flagged `delete: true`
/// are dropped here; callers that need to know about them must collect the
/// names before normalizing.
pub fn normalize_release_container(value: Value) -> Result<Value> {
    let entries = match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items,
        other => return Err(SchemaError::unsupported("a list of releases", &other).into()),
    };
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let release = normalize_release_entry(entry)?;
        if is_truthy(release.get("delete")) {
            continue;
        }
        out.push(Value::Mapping(release));
    }
    Ok(Value::Sequence(out))
}

fn normalize_release_entry(value: Value) -> Result<Mapping> {
    let entry = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(m) => m,
        other => return Err(SchemaError::unsupported("a release mapping", &other).into()),
    };
    let mut out = Mapping::new();
    for (key, value) in entry {
        let normalized = match key.as_str() {
            Some("before") | Some("after") => normalize_ancestry_container(value)?,
            Some("notes") => normalize_note_container(value)?,
            _ => value,
        };
        out.insert(key, normalized);
    }
    Ok(out)
}

/// Normalize a list of note objects (hard-coded notes on a release).
pub fn normalize_note_container(value: Value) -> Result<Value> {
    let entries = match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items,
        other => return Err(SchemaError::unsupported("a list of notes", &other).into()),
    };
    let out = entries
        .into_iter()
        .map(|entry| normalize_note_document(entry).map(Value::Mapping))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Sequence(out))
}

/// Normalize a single note document (one YAML document of a note file, or
/// one hard-coded note object in the configuration).
pub fn normalize_note_document(value: Value) -> Result<Mapping> {
    let note = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(m) => m,
        other => return Err(SchemaError::unsupported("a note mapping", &other).into()),
    };
    let mut out = Mapping::new();
    for (key, value) in note {
        let normalized = match key.as_str() {
            Some(k) => normalize_note_field(k, value)?,
            None => value,
        };
        out.insert(key, normalized);
    }
    Ok(out)
}

/// Normalize one field of a note.
///
/// Set-like fields become sorted lists of unique elements; localized
/// rich-text fields authored as hierarchical lists are flattened to strings.
pub fn normalize_note_field(key: &str, value: Value) -> Result<Value> {
    if is_set_like_key(key) {
        return normalize_set_like(value);
    }
    if key.ends_with(RICH_TEXT_SUFFIX) {
        if let Value::Mapping(locales) = value {
            let mut out = Mapping::new();
            for (locale, text) in locales {
                out.insert(locale, flatten_rich_text(text)?);
            }
            return Ok(Value::Mapping(out));
        }
        return Ok(value);
    }
    Ok(value)
}

/// Normalize a set-like value into a sorted, deduplicated list. Bare strings
/// become singletons; null becomes the empty set. Elements must be strings
/// (null is tolerated as the uncommitted sentinel).
pub fn normalize_set_like(value: Value) -> Result<Value> {
    let elements = match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![Value::String(s)],
        Value::Sequence(items) => {
            for item in &items {
                if !matches!(item, Value::Null | Value::String(_)) {
                    return Err(SchemaError::unsupported("a string or null element", item).into());
                }
            }
            items
        }
        other => return Err(SchemaError::unsupported("a string or a list of strings", &other).into()),
    };
    Ok(Value::Sequence(sorted_set(elements)))
}

/// Deduplicate and sort set elements. Null (the uncommitted sentinel) sorts
/// before every string.
pub fn sorted_set(mut elements: Vec<Value>) -> Vec<Value> {
    elements.sort_by(|a, b| set_element_key(a).cmp(&set_element_key(b)));
    elements.dedup();
    elements
}

fn set_element_key(value: &Value) -> (u8, &str) {
    match value {
        Value::Null => (0, ""),
        Value::String(s) => (1, s.as_str()),
        _ => (2, ""),
    }
}

/// Flatten a rich-text value. Flat strings pass through; hierarchical lists
/// become one string where depth-0 entries are paragraphs and deeper entries
/// are bulleted items indented two spaces per extra level.
fn flatten_rich_text(value: Value) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(s)),
        Value::Sequence(_) => {
            let mut items = Vec::new();
            collect_rich_text(&value, 0, &mut items)?;
            Ok(Value::String(serialize_rich_text(&items)))
        }
        other => Err(SchemaError::unsupported("flat rich text or a nested list", &other).into()),
    }
}

fn collect_rich_text<'a>(value: &'a Value, level: usize, out: &mut Vec<(usize, &'a str)>) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::String(s) => {
            if !s.is_empty() {
                out.push((level, s.as_str()));
            }
            Ok(())
        }
        Value::Sequence(items) => {
            for item in items {
                collect_rich_text(item, level, out)?;
            }
            Ok(())
        }
        Value::Mapping(map) => {
            for (head, inner) in map {
                collect_rich_text(head, level, out)?;
                collect_rich_text(inner, level + 1, out)?;
            }
            Ok(())
        }
        other => Err(SchemaError::unsupported("a string, list, or mapping in rich text", other).into()),
    }
}

fn serialize_rich_text(items: &[(usize, &str)]) -> String {
    let mut out = String::new();
    let mut previous_level = None;
    for &(level, text) in items {
        if level == 0 || previous_level != Some(level) {
            out.push('\n');
        }
        previous_level = Some(level);
        if level > 0 {
            for _ in 1..level {
                out.push_str("  ");
            }
            out.push_str("* ");
        }
        out.push_str(text);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Truthiness check for marker fields (`delete`, ghost marker, backstory
/// annotations). Only a literal boolean true counts.
pub fn is_truthy(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_ancestry_container_shapes() {
        let expected = yaml("[{name: 1.2.3}]");
        assert_eq!(expected, normalize_ancestry_container(yaml("1.2.3")).unwrap());
        assert_eq!(expected, normalize_ancestry_container(yaml("[1.2.3]")).unwrap());
        assert_eq!(expected, normalize_ancestry_container(yaml("[{name: 1.2.3}]")).unwrap());
        assert_eq!(yaml("[]"), normalize_ancestry_container(Value::Null).unwrap());
    }

    #[test]
    fn test_ancestry_entry_keeps_annotations() {
        let normalized =
            normalize_ancestry_container(yaml("[{name: 1.2.3, is-backstory: true}]")).unwrap();
        assert_eq!(yaml("[{name: 1.2.3, is-backstory: true}]"), normalized);
    }

    #[test]
    fn test_ancestry_entry_requires_name() {
        assert!(normalize_ancestry_container(yaml("[{is-backstory: true}]")).is_err());
        assert!(normalize_ancestry_container(yaml("[{name: 7}]")).is_err());
        assert!(normalize_ancestry_container(yaml("7")).is_err());
    }

    #[test]
    fn test_release_container_drops_deleted() {
        let normalized =
            normalize_release_container(yaml("[{name: 1.2.3}, {name: 1.2.2, delete: true}]"))
                .unwrap();
        assert_eq!(yaml("[{name: 1.2.3}]"), normalized);
    }

    #[test]
    fn test_release_entry_normalizes_ancestry() {
        let normalized =
            normalize_release_container(yaml("[{name: 1.2.3, after: 1.2.2}]")).unwrap();
        assert_eq!(yaml("[{name: 1.2.3, after: [{name: 1.2.2}]}]"), normalized);
    }

    #[test]
    fn test_set_like_shapes() {
        assert_eq!(yaml("[1.2.3]"), normalize_set_like(yaml("1.2.3")).unwrap());
        assert_eq!(yaml("[]"), normalize_set_like(Value::Null).unwrap());
        assert_eq!(yaml("[a, b]"), normalize_set_like(yaml("[b, a, b]")).unwrap());
        assert!(normalize_set_like(yaml("[7]")).is_err());
    }

    #[test]
    fn test_set_like_null_sentinel_sorts_first() {
        assert_eq!(yaml("[null, abc]"), normalize_set_like(yaml("[abc, null]")).unwrap());
    }

    #[test]
    fn test_rich_text_flat_string_passes_through() {
        let note = normalize_note_document(yaml("{public-loc-rst: {en-US: 'already flat'}}")).unwrap();
        assert_eq!(yaml("{public-loc-rst: {en-US: 'already flat'}}"), Value::Mapping(note));
    }

    #[test]
    fn test_rich_text_flattens_hlists() {
        let note = normalize_note_document(yaml(
            "{public-loc-rst: {en-US: [intro, {heading: [one, two]}]}}",
        ))
        .unwrap();
        let text = note
            .get("public-loc-rst")
            .and_then(|v| v.get("en-US"))
            .and_then(Value::as_str)
            .unwrap();
        assert_eq!("intro\n\nheading\n\n* one\n* two", text);
    }

    #[test]
    fn test_rich_text_nested_levels_indent() {
        let note = normalize_note_document(yaml(
            "{public-loc-rst: {en-US: [{heading: {sub: [leaf]}}]}}",
        ))
        .unwrap();
        let text = note
            .get("public-loc-rst")
            .and_then(|v| v.get("en-US"))
            .and_then(Value::as_str)
            .unwrap();
        assert_eq!("heading\n\n* sub\n\n  * leaf", text);
    }

    #[test]
    fn test_rich_text_skips_empty_entries() {
        let note = normalize_note_document(yaml(
            "{public-loc-rst: {en-US: [one, null, '', two]}}",
        ))
        .unwrap();
        let text = note
            .get("public-loc-rst")
            .and_then(|v| v.get("en-US"))
            .and_then(Value::as_str)
            .unwrap();
        assert_eq!("one\n\ntwo", text);
    }

    #[test]
    fn test_rich_text_rejects_unsupported_values() {
        assert!(normalize_note_document(yaml("{public-loc-rst: {en-US: [7]}}")).is_err());
    }

    #[test]
    fn test_root_normalization_is_idempotent() {
        let config = yaml(
            "{current_version: 1.2.3, parent_versions: 1.2.2, \
             releases: [{name: 1.2.2, after: [1.2.1]}, {name: 1.2.1}]}",
        );
        let once = normalize_root(config).unwrap();
        let twice = normalize_root(Value::Mapping(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_root_null_document_is_empty() {
        assert_eq!(Mapping::new(), normalize_root(Value::Null).unwrap());
    }
}
