//! `package` resources from the dpkg database

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use resfact_exec::CommandRunner;
use tracing::{debug, instrument};

use super::{ProviderSettings, raw_record, run_checked};
use crate::catalog::ResourceProvider;
use crate::error::ProviderError;
use crate::types::{InstanceHandle, ResolvedInstance, ResourceTypeName};

const DPKG_QUERY: &str = "dpkg-query";
const QUERY_FORMAT: &str = "${Package}\t${Version}\t${Architecture}\t${db:Status-Status}\n";

/// Debian packages known to dpkg
///
/// Multi-arch packages share a name, so only the last architecture listed
/// survives under that title.
pub struct PackageProvider {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    /// dpkg database of a non-host root
    admindir: Option<PathBuf>,
}

impl PackageProvider {
    /// Create a provider querying dpkg through `runner`
    ///
    /// Under a non-host root the query reads `<root>/var/lib/dpkg`.
    pub fn new(settings: &ProviderSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: settings.command_timeout,
            admindir: (!settings.is_host_root()).then(|| settings.path("/var/lib/dpkg")),
        }
    }

    fn query_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if let Some(admindir) = &self.admindir {
            args.push(format!("--admindir={}", admindir.display()));
        }
        args.push("--show".to_string());
        args.push(format!("--showformat={QUERY_FORMAT}"));
        args
    }

    /// Parse `name<TAB>version<TAB>arch<TAB>status`
    fn parse_line(line: &str) -> Result<ResolvedInstance, ProviderError> {
        let fields: Vec<&str> = line.split('\t').collect();
        let [name, version, arch, status] = fields[..] else {
            return Err(ProviderError::Parse(format!("unexpected dpkg-query line: {line}")));
        };

        // Installed packages report their version, like a pinned ensure
        let ensure = if status == "installed" { version } else { status };

        Ok(ResolvedInstance::new(name)
            .with("ensure", ensure)
            .with("version", version)
            .with("arch", arch)
            .with("status", status)
            .with("provider", "dpkg"))
    }
}

#[async_trait]
impl ResourceProvider for PackageProvider {
    fn type_name(&self) -> ResourceTypeName {
        "package".into()
    }

    #[instrument(skip(self), fields(runner = self.runner.runner_type()))]
    async fn list(&self) -> Result<Vec<InstanceHandle>, ProviderError> {
        let args = self.query_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = run_checked(self.runner.as_ref(), self.timeout, DPKG_QUERY, &args).await?;

        let handles: Vec<InstanceHandle> = stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| {
                let name = line.split('\t').next().unwrap_or(line);
                InstanceHandle::new("package", name).with_raw(line)
            })
            .collect();

        debug!(count = handles.len(), "listed packages");

        Ok(handles)
    }

    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError> {
        Self::parse_line(raw_record(handle)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::CannedRunner;
    use super::*;
    use crate::types::AttributeValue;

    #[tokio::test]
    async fn test_list_and_resolve() {
        let runner = Arc::new(CannedRunner::stdout(
            0,
            "vim\t2:9.0.1378-2\tamd64\tinstalled\nfoo\t1.0\tall\tconfig-files\n",
            "",
        ));
        let provider = PackageProvider::new(&ProviderSettings::default(), runner);

        let handles = provider.list().await.unwrap();
        assert_eq!(handles.len(), 2);

        let vim = provider.resolve(&handles[0]).await.unwrap();
        assert_eq!(vim.title, "vim");
        assert_eq!(vim.attributes["ensure"], AttributeValue::from("2:9.0.1378-2"));

        let foo = provider.resolve(&handles[1]).await.unwrap();
        assert_eq!(foo.attributes["ensure"], AttributeValue::from("config-files"));
    }

    #[tokio::test]
    async fn test_command_failure() {
        let runner = Arc::new(CannedRunner::stdout(2, "", "dpkg-query: error: database locked\n"));
        let provider = PackageProvider::new(&ProviderSettings::default(), runner);

        assert_eq!(
            provider.list().await.unwrap_err(),
            ProviderError::Command {
                status: 2,
                message: "dpkg-query: error: database locked".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_host_root_queries_default_database() {
        let runner = Arc::new(CannedRunner::stdout(0, "", ""));
        let provider = PackageProvider::new(&ProviderSettings::default(), runner.clone());

        provider.list().await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].starts_with("dpkg-query --show --showformat="));
    }

    #[tokio::test]
    async fn test_non_host_root_uses_image_database() {
        let runner = Arc::new(CannedRunner::stdout(0, "", ""));
        let settings = ProviderSettings {
            root: PathBuf::from("/mnt/image"),
            ..ProviderSettings::default()
        };
        let provider = PackageProvider::new(&settings, runner.clone());

        provider.list().await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert!(
            calls[0].starts_with("dpkg-query --admindir=/mnt/image/var/lib/dpkg --show "),
            "unexpected argv: {}",
            calls[0]
        );
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!(PackageProvider::parse_line("vim\t1.0").is_err());
    }
}
