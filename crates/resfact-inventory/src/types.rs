//! Inventory type definitions

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

// ============================================================================
// Resource types
// ============================================================================

/// Identifier of a resource kind (`user`, `mount`, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTypeName(String);

impl ResourceTypeName {
    /// Create a type name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ResourceTypeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ResourceTypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for ResourceTypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Attribute values
// ============================================================================

/// A single attribute value as reported by a provider
///
/// Providers are free to hand back rich values (timestamps, paths, raw
/// bytes). Serialization coerces those to strings so the published fact
/// only ever holds JSON primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Integer(i64),
    /// Unsigned integer (uids, byte counts)
    Unsigned(u64),
    /// Floating point; non-finite values serialize as `null`
    Float(f64),
    /// String
    String(String),
    /// Ordered list
    List(Vec<AttributeValue>),
    /// Nested string-keyed map
    Map(BTreeMap<String, AttributeValue>),
    /// Point in time, serialized as RFC 3339
    Timestamp(DateTime<Utc>),
    /// Filesystem path, serialized lossily as UTF-8
    Path(PathBuf),
    /// Raw bytes, serialized lossily as UTF-8
    Bytes(Vec<u8>),
}

impl AttributeValue {
    /// Build a list of strings
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeValue::List(
            items
                .into_iter()
                .map(|s| AttributeValue::String(s.into()))
                .collect(),
        )
    }

    /// String content, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Null => serializer.serialize_unit(),
            AttributeValue::Bool(b) => serializer.serialize_bool(*b),
            AttributeValue::Integer(i) => serializer.serialize_i64(*i),
            AttributeValue::Unsigned(u) => serializer.serialize_u64(*u),
            AttributeValue::Float(f) => serializer.serialize_f64(*f),
            AttributeValue::String(s) => serializer.serialize_str(s),
            AttributeValue::List(items) => serializer.collect_seq(items),
            AttributeValue::Map(map) => serializer.collect_map(map),
            AttributeValue::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            AttributeValue::Path(path) => serializer.serialize_str(&path.to_string_lossy()),
            AttributeValue::Bytes(bytes) => {
                serializer.serialize_str(&String::from_utf8_lossy(bytes))
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<u64> for AttributeValue {
    fn from(u: u64) -> Self {
        AttributeValue::Unsigned(u)
    }
}

impl From<u32> for AttributeValue {
    fn from(u: u32) -> Self {
        AttributeValue::Unsigned(u64::from(u))
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<PathBuf> for AttributeValue {
    fn from(p: PathBuf) -> Self {
        AttributeValue::Path(p)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(ts: DateTime<Utc>) -> Self {
        AttributeValue::Timestamp(ts)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeValue::Null, Into::into)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        AttributeValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Attribute name to value, one per instance
pub type Attributes = BTreeMap<String, AttributeValue>;

// ============================================================================
// Instances
// ============================================================================

/// Opaque token identifying one listed instance
///
/// Produced by listing and handed back unchanged to resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceHandle {
    /// Type the instance belongs to
    pub type_name: ResourceTypeName,
    /// Provider-specific identifier
    pub id: String,
    /// Raw source record captured while listing, if any
    pub raw: Option<String>,
}

impl InstanceHandle {
    /// Create a handle without a raw record
    pub fn new(type_name: impl Into<ResourceTypeName>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
            raw: None,
        }
    }

    /// Attach the raw source record
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

/// A fully resolved instance: its title and observed attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInstance {
    /// Canonical title, unique within its type
    pub title: String,
    /// Observed attributes
    pub attributes: Attributes,
}

impl ResolvedInstance {
    /// Create a resolved instance with no attributes
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

/// Title to attributes, for one resource type
pub type TypeResult = BTreeMap<String, Attributes>;

/// Type name to [`TypeResult`], for one collection run
pub type Inventory = BTreeMap<ResourceTypeName, TypeResult>;

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_rich_values_serialize_as_strings() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let instance = ResolvedInstance::new("root")
            .with("changed", ts)
            .with("home", PathBuf::from("/root"))
            .with("raw", AttributeValue::Bytes(b"ok\xff".to_vec()));

        let value = serde_json::to_value(&instance.attributes).unwrap();
        assert_eq!(
            value,
            json!({
                "changed": "2024-03-01T12:00:00+00:00",
                "home": "/root",
                "raw": "ok\u{fffd}",
            })
        );
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        let text = serde_json::to_string(&AttributeValue::Float(f64::NAN)).unwrap();
        assert_eq!(text, "null");
    }

    #[test]
    fn test_option_and_vec_conversions() {
        assert_eq!(AttributeValue::from(None::<String>), AttributeValue::Null);
        assert_eq!(
            AttributeValue::from(vec!["a", "b"]),
            AttributeValue::strings(["a", "b"])
        );
    }

    #[test]
    fn test_type_name_is_transparent() {
        let name = ResourceTypeName::from("mount");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"mount\"");
        assert_eq!(name.to_string(), "mount");
    }
}
