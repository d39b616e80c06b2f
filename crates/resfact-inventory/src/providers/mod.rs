//! Built-in system resource providers
//!
//! File-backed providers read system databases under a configurable root;
//! command-backed providers shell out through a [`CommandRunner`].

pub mod groups;
pub mod hosts;
pub mod mounts;
pub mod packages;
pub mod services;
pub mod users;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use resfact_exec::CommandRunner;
use tracing::debug;

use crate::catalog::ProviderRegistry;
use crate::error::ProviderError;
use crate::types::InstanceHandle;

pub use groups::GroupProvider;
pub use hosts::HostProvider;
pub use mounts::MountProvider;
pub use packages::PackageProvider;
pub use services::ServiceProvider;
pub use users::UserProvider;

/// Settings shared by the built-in providers
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Filesystem root that system files are read from
    pub root: PathBuf,
    /// Upper bound for each external command
    pub command_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            command_timeout: Duration::from_secs(30),
        }
    }
}

impl ProviderSettings {
    /// Resolve an absolute system path under [`root`](Self::root)
    #[must_use]
    pub fn path(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    /// Whether providers read the running host rather than an image
    #[must_use]
    pub fn is_host_root(&self) -> bool {
        self.root == Path::new("/")
    }
}

/// Build the catalog of built-in providers
///
/// Registration order is `user`, `group`, `host`, `mount`, `service`,
/// `package`.
pub fn system_catalog(settings: &ProviderSettings, runner: Arc<dyn CommandRunner>) -> ProviderRegistry {
    ProviderRegistry::new()
        .with(Arc::new(UserProvider::new(settings)))
        .with(Arc::new(GroupProvider::new(settings)))
        .with(Arc::new(HostProvider::new(settings)))
        .with(Arc::new(MountProvider::new(settings)))
        .with(Arc::new(ServiceProvider::new(settings, Arc::clone(&runner))))
        .with(Arc::new(PackageProvider::new(settings, runner)))
}

/// Read a whole system file
async fn read_source(path: &Path) -> Result<String, ProviderError> {
    debug!(path = %path.display(), "reading source");
    tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            ProviderError::MissingDependency(path.display().to_string())
        }
        std::io::ErrorKind::PermissionDenied => {
            ProviderError::PermissionDenied(path.display().to_string())
        }
        _ => ProviderError::Io(format!("{}: {e}", path.display())),
    })
}

/// Non-comment, non-blank lines of a colon/space separated database
fn records(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.trim_start().is_empty() && !l.trim_start().starts_with('#'))
}

/// Raw record carried by a handle
fn raw_record(handle: &InstanceHandle) -> Result<&str, ProviderError> {
    handle
        .raw
        .as_deref()
        .ok_or_else(|| ProviderError::Parse(format!("no source record for {}", handle.id)))
}

/// Run a command and return its stdout, mapping failures to provider errors
async fn run_checked(
    runner: &dyn CommandRunner,
    timeout: Duration,
    program: &str,
    args: &[&str],
) -> Result<String, ProviderError> {
    let output = runner.run_with_timeout(program, args, timeout).await?;
    if !output.success() {
        return Err(ProviderError::Command {
            status: output.status,
            message: output.stderr_summary().to_string(),
        });
    }
    Ok(output.stdout)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for provider tests

    use std::sync::Mutex;

    use async_trait::async_trait;
    use resfact_exec::{CommandOutput, ExecError};

    use super::*;

    /// Runner returning a canned result and recording invocations
    pub struct CannedRunner {
        result: Result<CommandOutput, ExecError>,
        pub calls: Mutex<Vec<String>>,
    }

    impl CannedRunner {
        pub fn stdout(status: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                result: Ok(CommandOutput {
                    status,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                    duration: Duration::from_millis(1),
                }),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn error(err: ExecError) -> Self {
            Self {
                result: Err(err),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for CannedRunner {
        async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ExecError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{program} {}", args.join(" ")));
            self.result.clone()
        }

        async fn run_with_timeout(
            &self,
            program: &str,
            args: &[&str],
            _timeout: Duration,
        ) -> Result<CommandOutput, ExecError> {
            self.run(program, args).await
        }

        fn runner_type(&self) -> &'static str {
            "canned"
        }
    }

    /// Settings rooted at a temp dir containing `files`
    pub fn rooted(files: &[(&str, &str)]) -> (tempfile::TempDir, ProviderSettings) {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path.trim_start_matches('/'));
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
        let settings = ProviderSettings {
            root: dir.path().to_path_buf(),
            ..ProviderSettings::default()
        };
        (dir, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CannedRunner;
    use super::*;
    use crate::catalog::TypeCatalog;

    #[test]
    fn test_settings_path_is_rooted() {
        let settings = ProviderSettings {
            root: PathBuf::from("/mnt/image"),
            ..ProviderSettings::default()
        };
        assert_eq!(settings.path("/etc/passwd"), PathBuf::from("/mnt/image/etc/passwd"));
    }

    #[test]
    fn test_is_host_root() {
        assert!(ProviderSettings::default().is_host_root());
        let image = ProviderSettings {
            root: PathBuf::from("/mnt/image"),
            ..ProviderSettings::default()
        };
        assert!(!image.is_host_root());
    }

    #[tokio::test]
    async fn test_read_source_names_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etc/passwd");

        let err = read_source(&path).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::MissingDependency(path.display().to_string())
        );
    }

    #[test]
    fn test_records_skip_comments_and_blanks() {
        let text = "# comment\n\nroot:x:0\n   # indented comment\nbin:x:1  \n";
        let lines: Vec<&str> = records(text).collect();
        assert_eq!(lines, vec!["root:x:0", "bin:x:1"]);
    }

    #[test]
    fn test_system_catalog_order() {
        let runner = Arc::new(CannedRunner::stdout(0, "", ""));
        let catalog = system_catalog(&ProviderSettings::default(), runner);
        let names: Vec<String> = catalog.list_types().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["user", "group", "host", "mount", "service", "package"]);
    }

    #[tokio::test]
    async fn test_run_checked_maps_exit_status() {
        let runner = CannedRunner::stdout(1, "", "\nboom\n");
        let err = run_checked(&runner, Duration::from_secs(1), "false", &[])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::Command {
                status: 1,
                message: "boom".to_string()
            }
        );
    }
}
