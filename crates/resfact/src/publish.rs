//! Fact output
//!
//! Wraps the normalized inventory under the fact name and writes it in
//! the external-fact JSON form: `{"<fact_name>": {...}}`.

use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

/// Publishes a normalized inventory as a named fact
#[derive(Debug, Clone)]
pub struct FactPublisher {
    fact_name: String,
    pretty: bool,
}

impl FactPublisher {
    /// Create a publisher for `fact_name`
    pub fn new(fact_name: impl Into<String>, pretty: bool) -> Self {
        Self {
            fact_name: fact_name.into(),
            pretty,
        }
    }

    /// The full fact document
    #[must_use]
    pub fn document(&self, inventory: Value) -> Value {
        let mut object = Map::new();
        object.insert(self.fact_name.clone(), inventory);
        Value::Object(object)
    }

    /// Write the fact document to `writer`, newline terminated
    ///
    /// # Errors
    /// Returns error if encoding or writing fails
    pub fn write_to<W: Write>(&self, mut writer: W, inventory: Value) -> eyre::Result<()> {
        let text = resfact_inventory::to_fact_json(&self.document(inventory), self.pretty)?;
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Write the fact document to `path`, replacing it atomically
    ///
    /// # Errors
    /// Returns error if the file cannot be written or renamed
    pub fn write_file(&self, path: &Path, inventory: Value) -> eyre::Result<()> {
        let tmp = path.with_extension("json.tmp");
        {
            let file = std::fs::File::create(&tmp)?;
            self.write_to(std::io::BufWriter::new(file), inventory)?;
        }
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "wrote fact file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_document_wraps_inventory() {
        let publisher = FactPublisher::new("resources", false);
        let doc = publisher.document(json!({ "user": { "root": { "uid": 0 } } }));
        assert_eq!(doc, json!({ "resources": { "user": { "root": { "uid": 0 } } } }));
    }

    #[test]
    fn test_write_to_buffer() {
        let publisher = FactPublisher::new("resources", false);
        let mut out = Vec::new();
        publisher.write_to(&mut out, json!({})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"resources\":{}}\n");
    }

    #[test]
    fn test_write_file_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources.json");
        std::fs::write(&path, "stale").unwrap();

        let publisher = FactPublisher::new("resources", true);
        publisher
            .write_file(&path, json!({ "host": { "localhost": {} } }))
            .unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({ "resources": { "host": { "localhost": {} } } }));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
