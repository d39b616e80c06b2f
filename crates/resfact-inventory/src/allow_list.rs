//! Allow-list loading
//!
//! The allow-list file is written by the managing process from a previous
//! run's inventory, so on first boot it does not exist yet. Every failure
//! mode here therefore degrades to "collect everything".

use std::path::Path;

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::AllowListError;
use crate::types::ResourceTypeName;

/// Location the managing process writes the allow-list to
pub const DEFAULT_ALLOW_LIST_PATH: &str = "/etc/puppet/resource_facts.yaml";

/// Which resource types a run may collect
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowList {
    /// No filtering
    #[default]
    Unrestricted,
    /// Only the named types (never empty)
    Only(Vec<ResourceTypeName>),
}

/// Where an [`AllowList`] came from, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowListSource {
    /// No file at the configured path
    Missing,
    /// File present but listing no types
    Empty,
    /// File present and parsed
    Loaded,
    /// File present but rejected
    Malformed(AllowListError),
}

impl AllowList {
    /// Restrict to `names`; an empty list means unrestricted
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ResourceTypeName>,
    {
        let names: Vec<ResourceTypeName> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            AllowList::Unrestricted
        } else {
            AllowList::Only(names)
        }
    }

    /// Whether `type_name` may be collected
    #[must_use]
    pub fn permits(&self, type_name: &ResourceTypeName) -> bool {
        match self {
            AllowList::Unrestricted => true,
            AllowList::Only(names) => names.contains(type_name),
        }
    }

    /// Whether no filtering applies
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, AllowList::Unrestricted)
    }

    /// Parse allow-list YAML
    ///
    /// Accepts a sequence of strings. An empty document, `null`, `false`
    /// and `[]` all mean unrestricted.
    ///
    /// # Errors
    /// Returns an error if the text is not YAML or not a sequence of strings.
    pub fn from_yaml_str(text: &str) -> Result<Self, AllowListError> {
        if text.trim().is_empty() {
            return Ok(AllowList::Unrestricted);
        }

        let value: Value =
            serde_yaml::from_str(text).map_err(|e| AllowListError::InvalidYaml(e.to_string()))?;

        let entries = match value {
            Value::Null | Value::Bool(false) => return Ok(AllowList::Unrestricted),
            Value::Sequence(entries) => entries,
            Value::Bool(true) => return Err(AllowListError::NotASequence("boolean")),
            Value::Number(_) => return Err(AllowListError::NotASequence("number")),
            Value::String(_) => return Err(AllowListError::NotASequence("string")),
            Value::Mapping(_) => return Err(AllowListError::NotASequence("mapping")),
            Value::Tagged(_) => return Err(AllowListError::NotASequence("tagged value")),
        };

        let names = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                Value::String(name) => Ok(ResourceTypeName::new(name)),
                _ => Err(AllowListError::NonStringEntry { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AllowList::only(names))
    }

    /// Load the allow-list from `path`
    ///
    /// Never fails: a missing, unreadable or malformed file yields
    /// [`AllowList::Unrestricted`], with the reason in the returned source.
    pub fn load(path: &Path) -> (Self, AllowListSource) {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no allow-list, collecting all types");
                return (AllowList::Unrestricted, AllowListSource::Missing);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "allow-list unreadable, collecting all types");
                return (
                    AllowList::Unrestricted,
                    AllowListSource::Malformed(AllowListError::Unreadable(e.to_string())),
                );
            }
        };

        match Self::from_yaml_str(&text) {
            Ok(AllowList::Unrestricted) => {
                debug!(path = %path.display(), "allow-list empty, collecting all types");
                (AllowList::Unrestricted, AllowListSource::Empty)
            }
            Ok(list) => {
                if let AllowList::Only(names) = &list {
                    debug!(path = %path.display(), count = names.len(), "loaded allow-list");
                }
                (list, AllowListSource::Loaded)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "allow-list malformed, collecting all types");
                (AllowList::Unrestricted, AllowListSource::Malformed(e))
            }
        }
    }
}
