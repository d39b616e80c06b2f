//! `service` resources from systemd

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

const SYSTEMCTL: &str = "systemctl";
const LIST_ARGS: &[&str] = &[
    "list-units",
    "--type=service",
    "--all",
    "--no-legend",
    "--no-pager",
    "--plain",
];

/// systemd service units
pub struct ServiceProvider {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    /// Set when reading a non-host root, which systemctl cannot target
    foreign_root: Option<PathBuf>,
}

impl ServiceProvider {
    /// Create a provider listing units through `runner`
    pub fn new(settings: &ProviderSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: settings.command_timeout,
            foreign_root: (!settings.is_host_root()).then(|| settings.root.clone()),
        }
    }

    /// Parse `UNIT LOAD ACTIVE SUB DESCRIPTION...`
    fn parse_line(line: &str) -> Result<ResolvedInstance, ProviderError> {
        let line = line.trim_start_matches('●').trim();
        let mut rest = line;

        let (Some(unit), Some(load), Some(active), Some(sub)) = (
            take_field(&mut rest),
            take_field(&mut rest),
            take_field(&mut rest),
            take_field(&mut rest),
        ) else {
            return Err(ProviderError::Parse(format!("unexpected unit line: {line}")));
        };
        let description = rest.trim();

        let ensure = if active == "active" { "running" } else { "stopped" };

        Ok(ResolvedInstance::new(unit)
            .with("ensure", ensure)
            .with("load", load)
            .with("active", active)
            .with("sub", sub)
            .with("description", description)
            .with("provider", "systemd"))
    }
}

/// Split the next whitespace-delimited field off the front of `rest`
fn take_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (field, tail) = trimmed.split_at(end);
    *rest = tail;
    (!field.is_empty()).then_some(field)
}

#[async_trait]
impl ResourceProvider for ServiceProvider {
    fn type_name(&self) -> ResourceTypeName {
        "service".into()
    }

    #[instrument(skip(self), fields(runner = self.runner.runner_type()))]
    async fn list(&self) -> Result<Vec<InstanceHandle>, ProviderError> {
        if let Some(root) = &self.foreign_root {
            return Err(ProviderError::Unsupported(format!(
                "systemd units cannot be listed under root {}",
                root.display()
            )));
        }

        let stdout = run_checked(self.runner.as_ref(), self.timeout, SYSTEMCTL, LIST_ARGS)
            .await
            .map_err(|e| match e {
                ProviderError::Command { message, .. }
                    if message.contains("not been booted with systemd")
                        || message.contains("Failed to connect to bus") =>
                {
                    ProviderError::Unsupported(message)
                }
                other => other,
            })?;

        let handles: Vec<InstanceHandle> = stdout
            .lines()
            .map(|l| l.trim_start_matches('●').trim())
            .filter(|l| !l.is_empty())
            .map(|line| {
                let unit = line.split_whitespace().next().unwrap_or(line);
                InstanceHandle::new("service", unit).with_raw(line)
            })
            .collect();

        debug!(count = handles.len(), "listed service units");

        Ok(handles)
    }

    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError> {
        Self::parse_line(raw_record(handle)?)
    }
}

#[cfg(test)]
mod tests {
    use resfact_exec::ExecError;

    use super::super::testing::CannedRunner;
    use super::*;
    use crate::types::AttributeValue;

    const UNITS: &str = "\
ssh.service      loaded active   running OpenBSD Secure Shell server
cron.service     loaded inactive dead    Regular background program processing daemon
● bad.service    not-found inactive dead bad.service
";

    #[tokio::test]
    async fn test_list_and_resolve() {
        let runner = Arc::new(CannedRunner::stdout(0, UNITS, ""));
        let provider = ServiceProvider::new(&ProviderSettings::default(), runner.clone());

        let handles = provider.list().await.unwrap();
        let ids: Vec<&str> = handles.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["ssh.service", "cron.service", "bad.service"]);
        assert_eq!(
            runner.calls.lock().unwrap()[0],
            "systemctl list-units --type=service --all --no-legend --no-pager --plain"
        );

        let ssh = provider.resolve(&handles[0]).await.unwrap();
        assert_eq!(ssh.attributes["ensure"], AttributeValue::from("running"));
        assert_eq!(
            ssh.attributes["description"],
            AttributeValue::from("OpenBSD Secure Shell server")
        );

        let cron = provider.resolve(&handles[1]).await.unwrap();
        assert_eq!(cron.attributes["ensure"], AttributeValue::from("stopped"));

        let bad = provider.resolve(&handles[2]).await.unwrap();
        assert_eq!(bad.attributes["load"], AttributeValue::from("not-found"));
    }

    #[tokio::test]
    async fn test_missing_systemctl() {
        let runner = Arc::new(CannedRunner::error(ExecError::NotFound(SYSTEMCTL.to_string())));
        let provider = ServiceProvider::new(&ProviderSettings::default(), runner);

        let err = provider.list().await.unwrap_err();
        assert_eq!(err, ProviderError::MissingDependency("systemctl".to_string()));
    }

    #[tokio::test]
    async fn test_not_booted_with_systemd_is_unsupported() {
        let runner = Arc::new(CannedRunner::stdout(
            1,
            "",
            "System has not been booted with systemd as init system (PID 1). Can't operate.\n",
        ));
        let provider = ServiceProvider::new(&ProviderSettings::default(), runner);

        assert!(matches!(
            provider.list().await,
            Err(ProviderError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_non_host_root_is_unsupported_without_running_systemctl() {
        let runner = Arc::new(CannedRunner::stdout(0, UNITS, ""));
        let settings = ProviderSettings {
            root: PathBuf::from("/mnt/image"),
            ..ProviderSettings::default()
        };
        let provider = ServiceProvider::new(&settings, runner.clone());

        let err = provider.list().await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Unsupported(
                "systemd units cannot be listed under root /mnt/image".to_string()
            )
        );
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_truncated_line() {
        assert!(ServiceProvider::parse_line("ssh.service loaded").is_err());
    }
}
