//! `user` resources from the passwd database

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::instrument;

use super::{ProviderSettings, raw_record, read_source, records};
use crate::catalog::ResourceProvider;
use crate::error::ProviderError;
use crate::types::{InstanceHandle, ResolvedInstance, ResourceTypeName};

/// Local user accounts
pub struct UserProvider {
    passwd: PathBuf,
}

impl UserProvider {
    /// Create a provider reading `<root>/etc/passwd`
    #[must_use]
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            passwd: settings.path("/etc/passwd"),
        }
    }

    /// Parse one passwd line
    ///
    /// Format: `name:password:uid:gid:gecos:home:shell`
    fn parse_line(line: &str) -> Result<ResolvedInstance, ProviderError> {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 7 {
            return Err(ProviderError::Parse(format!(
                "passwd entry has {} fields, expected 7: {line}",
                fields.len()
            )));
        }

        let uid: u64 = fields[2]
            .parse()
            .map_err(|_| ProviderError::Parse(format!("invalid uid {:?}", fields[2])))?;
        let gid: u64 = fields[3]
            .parse()
            .map_err(|_| ProviderError::Parse(format!("invalid gid {:?}", fields[3])))?;

        // gecos holds comma-separated fields, the first being the full name
        let comment = fields[4].split(',').next().unwrap_or("").to_string();

        Ok(ResolvedInstance::new(fields[0])
            .with("ensure", "present")
            .with("uid", uid)
            .with("gid", gid)
            .with("comment", comment)
            .with("home", PathBuf::from(fields[5]))
            .with("shell", PathBuf::from(fields[6]))
            .with("provider", "useradd"))
    }
}

#[async_trait]
impl ResourceProvider for UserProvider {
    fn type_name(&self) -> ResourceTypeName {
        "user".into()
    }

    #[instrument(skip(self), fields(path = %self.passwd.display()))]
    async fn list(&self) -> Result<Vec<InstanceHandle>, ProviderError> {
        let text = read_source(&self.passwd).await?;

        Ok(records(&text)
            // NIS compat entries are not local accounts
            .filter(|line| !line.starts_with('+') && !line.starts_with('-'))
            .map(|line| {
                let name = line.split(':').next().unwrap_or(line);
                InstanceHandle::new("user", name).with_raw(line)
            })
            .collect())
    }

    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError> {
        Self::parse_line(raw_record(handle)?)
    }
}
