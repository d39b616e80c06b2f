//! Inventory normalization
//!
//! Encodes each type to JSON text and parses it back, so the published
//! value is exactly what a consumer parsing the fact would see.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::types::{Inventory, ResourceTypeName};

/// A type dropped because its values could not be encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationAnomaly {
    /// Resource type that was dropped
    pub type_name: ResourceTypeName,
    /// Encoder error
    pub message: String,
}

/// Output of [`normalize`]
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// JSON object keyed by type name
    pub value: Value,
    /// Types dropped during encoding
    pub anomalies: Vec<SerializationAnomaly>,
}

/// Normalize an inventory into plain JSON values
#[must_use]
pub fn normalize(inventory: &Inventory) -> Normalized {
    normalize_types(inventory)
}

/// Normalize any type-keyed map of serializable values
///
/// Each type is round-tripped on its own; a type that fails to encode is
/// left out and recorded instead of failing the whole document.
pub fn normalize_types<T: Serialize>(types: &BTreeMap<ResourceTypeName, T>) -> Normalized {
    let mut object = Map::new();
    let mut anomalies = Vec::new();

    for (type_name, result) in types {
        match round_trip(result) {
            Ok(value) => {
                object.insert(type_name.to_string(), value);
            }
            Err(e) => {
                warn!(type_name = %type_name, error = %e, "type not encodable, dropping");
                anomalies.push(SerializationAnomaly {
                    type_name: type_name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    Normalized {
        value: Value::Object(object),
        anomalies,
    }
}

fn round_trip<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    let text = serde_json::to_string(value)?;
    serde_json::from_str(&text)
}

/// Render a normalized value as fact text
///
/// # Errors
/// Returns an error if encoding fails, which cannot happen for values
/// produced by [`normalize`].
pub fn to_fact_json(value: &Value, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde::Serializer;
    use serde_json::json;

    use super::*;
    use crate::types::{AttributeValue, Attributes, TypeResult};

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("foreign handle"))
        }
    }

    #[test]
    fn test_normalize_coerces_rich_values() {
        let mut attrs = Attributes::new();
        attrs.insert("ensure".to_string(), "mounted".into());
        attrs.insert("target".to_string(), PathBuf::from("/etc/fstab").into());
        attrs.insert("dump".to_string(), AttributeValue::Unsigned(0));
        attrs.insert("ratio".to_string(), AttributeValue::Float(f64::INFINITY));
        let mut mounts = TypeResult::new();
        mounts.insert("/".to_string(), attrs);
        let mut inventory = Inventory::new();
        inventory.insert("mount".into(), mounts);

        let normalized = normalize(&inventory);

        assert!(normalized.anomalies.is_empty());
        assert_eq!(
            normalized.value,
            json!({
                "mount": {
                    "/": {
                        "dump": 0,
                        "ensure": "mounted",
                        "ratio": null,
                        "target": "/etc/fstab",
                    }
                }
            })
        );
    }

    #[test]
    fn test_unencodable_type_is_dropped() {
        let mut types = BTreeMap::new();
        types.insert(ResourceTypeName::from("broken"), vec![Unencodable]);
        types.insert(ResourceTypeName::from("fine"), Vec::new());

        let normalized = normalize_types(&types);

        assert_eq!(normalized.value, json!({ "fine": [] }));
        assert_eq!(normalized.anomalies.len(), 1);
        assert_eq!(normalized.anomalies[0].type_name.as_str(), "broken");
        assert!(normalized.anomalies[0].message.contains("foreign handle"));
    }

    #[test]
    fn test_empty_inventory() {
        let normalized = normalize(&Inventory::new());
        assert_eq!(normalized.value, json!({}));
        assert_eq!(to_fact_json(&normalized.value, false).unwrap(), "{}");
    }
}
