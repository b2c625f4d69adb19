// src/metadata.rs
//
// Ordered key/value metadata attached to an image, persisted as a sidecar
// text file next to the image. The sidecar shape is fixed:
//
//   { "metadata" : [
//   { "label": "<key>", "value": "<value>" },
//   ...
//   ] }
//
// The parser is a deliberate hand-rolled scanner matched to that exact
// shape: each entry is the text between a `{` and the next `}`, split on
// `"` into exactly 9 fields. Anything else is a fatal parse error.

use crate::error::{CamstageError, Result};
use std::path::{Path, PathBuf};

/// Insertion-ordered string map with unique keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; replacement keeps the key's original position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse sidecar text. `origin` only labels errors.
    pub fn from_sidecar(text: &str, origin: &str) -> Result<Self> {
        let malformed = |reason: &'static str| {
            CamstageError::malformed_sidecar(origin.to_string(), reason)
        };

        let start = text.find('[').ok_or_else(|| malformed("missing entry array"))?;
        let mut rest = &text[start + 1..];
        let mut meta = Metadata::new();

        loop {
            let open = match rest.find('{') {
                Some(open) => open,
                None => break,
            };
            // The array may close before another entry opens
            if rest.find(']').is_some_and(|close| close < open) {
                break;
            }
            let entry_text = &rest[open + 1..];
            let close = entry_text
                .find('}')
                .ok_or_else(|| malformed("unterminated entry"))?;
            let fields: Vec<&str> = entry_text[..close].split('"').collect();
            if fields.len() != 9 {
                return Err(malformed("entry does not have exactly 9 quoted fields"));
            }
            if fields[1] != "label" || fields[5] != "value" {
                return Err(malformed("entry fields are not label/value"));
            }
            meta.set(fields[3], fields[7]);
            rest = &entry_text[close + 1..];
        }
        Ok(meta)
    }

    /// Serialize to the fixed sidecar shape.
    pub fn to_sidecar(&self) -> String {
        let mut out = String::from("{ \"metadata\" : [\n");
        for (i, (k, v)) in self.entries.iter().enumerate() {
            out.push_str("{ \"label\": \"");
            out.push_str(k);
            out.push_str("\", \"value\": \"");
            out.push_str(v);
            out.push_str("\" }");
            if i + 1 < self.entries.len() {
                out.push(',');
            }
            out.push('\n');
        }
        out.push_str("] }\n");
        out
    }
}

/// Sidecar path for an image path: the file name truncated at its first `.`,
/// with `.json` appended.
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    let name = image_path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let stem = match name.find('.') {
        Some(dot) => &name[..dot],
        None => &name,
    };
    image_path.with_file_name(format!("{stem}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_replace_preserves_order() {
        let mut meta = Metadata::new();
        meta.set("exposure", "100");
        meta.set("gain", "4");
        meta.set("exposure", "250");
        assert_eq!(meta.len(), 2);
        assert_eq!(meta.get("exposure"), Some("250"));
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["exposure", "gain"]);
    }

    #[test]
    fn test_sidecar_roundtrip() {
        let mut meta = Metadata::new();
        meta.set("exposure", "100");
        meta.set("white-balance", "auto");
        let text = meta.to_sidecar();
        let parsed = Metadata::from_sidecar(&text, "test.json").unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn test_sidecar_roundtrip_empty() {
        let meta = Metadata::new();
        let parsed = Metadata::from_sidecar(&meta.to_sidecar(), "test.json").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_exact_shape() {
        let text = "{ \"metadata\" : [\n{ \"label\": \"exposure\", \"value\": \"100\" }\n] }\n";
        let meta = Metadata::from_sidecar(text, "x.json").unwrap();
        assert_eq!(meta.get("exposure"), Some("100"));
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        let text = "{ \"metadata\" : [ { \"label\": \"a\" } ] }";
        let err = Metadata::from_sidecar(text, "x.json").unwrap_err();
        assert!(matches!(err, CamstageError::MalformedSidecar { .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_field_names() {
        let text = "{ \"metadata\" : [ { \"key\": \"a\", \"value\": \"b\" } ] }";
        assert!(Metadata::from_sidecar(text, "x.json").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_array() {
        assert!(Metadata::from_sidecar("{ }", "x.json").is_err());
    }

    #[test]
    fn test_parse_rejects_unterminated_entry() {
        let text = "{ \"metadata\" : [ { \"label\": \"a\", \"value\": \"b\" ";
        assert!(Metadata::from_sidecar(text, "x.json").is_err());
    }

    #[test]
    fn test_sidecar_path_truncates_at_first_dot() {
        assert_eq!(
            sidecar_path(Path::new("/sd/frame.jpg")),
            PathBuf::from("/sd/frame.json")
        );
        assert_eq!(
            sidecar_path(Path::new("/sd/frame.tmp.bmp")),
            PathBuf::from("/sd/frame.json")
        );
        assert_eq!(
            sidecar_path(Path::new("frame")),
            PathBuf::from("frame.json")
        );
    }
}
