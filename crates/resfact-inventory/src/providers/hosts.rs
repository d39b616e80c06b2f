//! `host` resources from the static hosts table

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::instrument;

use super::{ProviderSettings, raw_record, read_source, records};
use crate::catalog::ResourceProvider;
use crate::error::ProviderError;
use crate::types::{AttributeValue, InstanceHandle, ResolvedInstance, ResourceTypeName};

/// Entries of `/etc/hosts`
///
/// The canonical name is the title, so a name listed on several lines
/// (`localhost` for both address families) keeps the last line.
pub struct HostProvider {
    hosts: PathBuf,
}

impl HostProvider {
    /// Create a provider reading `<root>/etc/hosts`
    #[must_use]
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            hosts: settings.path("/etc/hosts"),
        }
    }

    fn parse_line(line: &str) -> Result<ResolvedInstance, ProviderError> {
        let (entry, comment) = match line.split_once('#') {
            Some((entry, comment)) => (entry, Some(comment.trim())),
            None => (line, None),
        };

        let mut fields = entry.split_whitespace();
        let (Some(ip), Some(name)) = (fields.next(), fields.next()) else {
            return Err(ProviderError::Parse(format!("hosts entry without a name: {line}")));
        };

        let mut instance = ResolvedInstance::new(name)
            .with("ensure", "present")
            .with("ip", ip)
            .with("host_aliases", AttributeValue::strings(fields))
            .with("target", "/etc/hosts")
            .with("provider", "parsed");

        if let Some(comment) = comment.filter(|c| !c.is_empty()) {
            instance = instance.with("comment", comment);
        }

        Ok(instance)
    }
}

#[async_trait]
impl ResourceProvider for HostProvider {
    fn type_name(&self) -> ResourceTypeName {
        "host".into()
    }

    #[instrument(skip(self), fields(path = %self.hosts.display()))]
    async fn list(&self) -> Result<Vec<InstanceHandle>, ProviderError> {
        let text = read_source(&self.hosts).await?;

        Ok(records(&text)
            .map(|line| {
                let name = line.split_whitespace().nth(1).unwrap_or(line);
                InstanceHandle::new("host", name).with_raw(line)
            })
            .collect())
    }

    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError> {
        Self::parse_line(raw_record(handle)?)
    }
}
