//! `group` resources from the group database

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::instrument;

use super::{ProviderSettings, raw_record, read_source, records};
use crate::catalog::ResourceProvider;
use crate::error::ProviderError;
use crate::types::{AttributeValue, InstanceHandle, ResolvedInstance, ResourceTypeName};

/// Local groups
pub struct GroupProvider {
    group: PathBuf,
}

impl GroupProvider {
    /// Create a provider reading `<root>/etc/group`
    #[must_use]
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            group: settings.path("/etc/group"),
        }
    }

    /// Parse `name:password:gid:member,member`
    fn parse_line(line: &str) -> Result<ResolvedInstance, ProviderError> {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 4 {
            return Err(ProviderError::Parse(format!(
                "group entry has {} fields, expected 4: {line}",
                fields.len()
            )));
        }

        let gid: u64 = fields[2]
            .parse()
            .map_err(|_| ProviderError::Parse(format!("invalid gid {:?}", fields[2])))?;

        let members = fields[3]
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty());

        Ok(ResolvedInstance::new(fields[0])
            .with("ensure", "present")
            .with("gid", gid)
            .with("members", AttributeValue::strings(members))
            .with("provider", "groupadd"))
    }
}

#[async_trait]
impl ResourceProvider for GroupProvider {
    fn type_name(&self) -> ResourceTypeName {
        "group".into()
    }

    #[instrument(skip(self), fields(path = %self.group.display()))]
    async fn list(&self) -> Result<Vec<InstanceHandle>, ProviderError> {
        let text = read_source(&self.group).await?;

        Ok(records(&text)
            .filter(|line| !line.starts_with('+') && !line.starts_with('-'))
            .map(|line| {
                let name = line.split(':').next().unwrap_or(line);
                InstanceHandle::new("group", name).with_raw(line)
            })
            .collect())
    }

    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError> {
        Self::parse_line(raw_record(handle)?)
    }
}
