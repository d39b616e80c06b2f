//! Error types for resfact-inventory

use std::time::Duration;

use resfact_exec::ExecError;
use thiserror::Error;

/// Errors a resource provider can raise while listing or resolving
///
/// The collector never propagates these; they end up in the
/// [`CollectionReport`](crate::collector::CollectionReport).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// No provider registered under this type name
    #[error("unknown resource type: {0}")]
    UnknownType(String),

    /// Type cannot be enumerated on this platform
    #[error("enumeration not supported: {0}")]
    Unsupported(String),

    /// An external program or file the provider needs is missing
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// Insufficient privileges to read the source
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error reading a system source
    #[error("I/O error: {0}")]
    Io(String),

    /// External command exited unsuccessfully
    #[error("command failed: {status} - {message}")]
    Command {
        /// Exit status
        status: i32,
        /// Error message
        message: String,
    },

    /// Source data could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// External command did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ExecError> for ProviderError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::NotFound(program) => ProviderError::MissingDependency(program),
            ExecError::PermissionDenied(program) => ProviderError::PermissionDenied(program),
            ExecError::Timeout { timeout } => ProviderError::Timeout(timeout),
            other => ProviderError::Io(other.to_string()),
        }
    }
}

/// Reasons an allow-list source is rejected
///
/// These never abort a run: a rejected source degrades to
/// [`AllowList::Unrestricted`](crate::allow_list::AllowList::Unrestricted).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllowListError {
    /// File exists but could not be read
    #[error("unreadable allow-list: {0}")]
    Unreadable(String),

    /// Content is not valid YAML
    #[error("invalid YAML: {0}")]
    InvalidYaml(String),

    /// Root of the document is not a sequence
    #[error("expected a sequence of type names, found {0}")]
    NotASequence(&'static str),

    /// A sequence entry is not a string
    #[error("entry {index} is not a string")]
    NonStringEntry {
        /// Zero-based position in the sequence
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_not_found_is_missing_dependency() {
        let err: ProviderError = ExecError::NotFound("systemctl".to_string()).into();
        assert_eq!(err, ProviderError::MissingDependency("systemctl".to_string()));
    }
}
