//! `mount` resources from the kernel mount table

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::instrument;

use super::{ProviderSettings, raw_record, read_source, records};
use crate::catalog::ResourceProvider;
use crate::error::ProviderError;
use crate::types::{AttributeValue, InstanceHandle, ResolvedInstance, ResourceTypeName};

/// Currently mounted filesystems
pub struct MountProvider {
    mounts: PathBuf,
}

impl MountProvider {
    /// Create a provider reading `<root>/proc/mounts`
    #[must_use]
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            mounts: settings.path("/proc/mounts"),
        }
    }

    /// Parse `device mountpoint fstype options dump pass`
    fn parse_line(line: &str) -> Result<ResolvedInstance, ProviderError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ProviderError::Parse(format!(
                "mount entry has {} fields, expected 6: {line}",
                fields.len()
            )));
        }

        Ok(ResolvedInstance::new(unescape(fields[1]))
            .with("ensure", "mounted")
            .with("device", unescape(fields[0]))
            .with("fstype", fields[2])
            .with("options", AttributeValue::strings(fields[3].split(',')))
            .with("dump", fields[4])
            .with("pass", fields[5])
            .with("provider", "parsed"))
    }
}

/// Decode the octal escapes (`\040` for space) the kernel uses in mount fields
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 3 < bytes.len()
            && bytes[i + 1..=i + 3].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let octal = &field[i + 1..=i + 3];
            if let Ok(byte) = u8::from_str_radix(octal, 8) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[async_trait]
impl ResourceProvider for MountProvider {
    fn type_name(&self) -> ResourceTypeName {
        "mount".into()
    }

    #[instrument(skip(self), fields(path = %self.mounts.display()))]
    async fn list(&self) -> Result<Vec<InstanceHandle>, ProviderError> {
        let text = read_source(&self.mounts).await?;

        Ok(records(&text)
            .map(|line| {
                let target = line.split_whitespace().nth(1).unwrap_or(line);
                InstanceHandle::new("mount", target).with_raw(line)
            })
            .collect())
    }

    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError> {
        Self::parse_line(raw_record(handle)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::rooted;
    use super::*;

    const MOUNTS: &str = "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec 0 0
/dev/sdb1 /media/usb\\040disk vfat rw 0 0
";

    #[tokio::test]
    async fn test_list_and_resolve() {
        let (_dir, settings) = rooted(&[("/proc/mounts", MOUNTS)]);
        let provider = MountProvider::new(&settings);

        let handles = provider.list().await.unwrap();
        assert_eq!(handles.len(), 3);

        let root = provider.resolve(&handles[0]).await.unwrap();
        assert_eq!(root.title, "/");
        assert_eq!(root.attributes["device"], AttributeValue::from("/dev/sda1"));
        assert_eq!(
            root.attributes["options"],
            AttributeValue::strings(["rw", "relatime"])
        );

        let usb = provider.resolve(&handles[2]).await.unwrap();
        assert_eq!(usb.title, "/media/usb disk");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("/a\\040b"), "/a b");
        assert_eq!(unescape("/tab\\011"), "/tab\t");
        assert_eq!(unescape("/trailing\\04"), "/trailing\\04");
        assert_eq!(unescape("/plain"), "/plain");
    }

    #[test]
    fn test_parse_rejects_short_line() {
        assert!(MountProvider::parse_line("/dev/sda1 /").is_err());
    }
}
