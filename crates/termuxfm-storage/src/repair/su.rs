//! `chmod` through a superuser binary.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use termuxfm_core::config::repair::RepairConfig;
use termuxfm_core::traits::repair::PermissionRepair;

/// Runs `<su_binary> -c "chmod <mode> '<path>'"`.
#[derive(Debug, Clone)]
pub struct SuChmod {
    su_binary: String,
}

impl SuChmod {
    /// Create a runner invoking the given superuser binary.
    pub fn new(su_binary: impl Into<String>) -> Self {
        Self {
            su_binary: su_binary.into(),
        }
    }

    /// Create a runner from the `[repair]` configuration section.
    pub fn from_config(config: &RepairConfig) -> Self {
        Self::new(config.su_binary.clone())
    }

    /// The shell command handed to the superuser binary.
    pub fn chmod_command(target: &Path, mode: u32) -> String {
        format!(
            "chmod {mode:o} {}",
            shell_quote(&target.to_string_lossy())
        )
    }

    async fn run(&self, command: &str) -> Option<std::process::Output> {
        let result = Command::new(&self.su_binary)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(su = %self.su_binary, error = %e, "Failed to launch superuser binary");
                None
            }
        }
    }
}

#[async_trait]
impl PermissionRepair for SuChmod {
    fn name(&self) -> &str {
        "su-chmod"
    }

    async fn apply_mode(&self, target: &Path, mode: u32) -> bool {
        let command = Self::chmod_command(target, mode);
        let Some(output) = self.run(&command).await else {
            return false;
        };

        if output.status.success() {
            debug!(command = %command, "Privileged chmod succeeded");
            true
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                command = %command,
                status = %output.status,
                stderr = %stderr.trim(),
                "Privileged chmod failed"
            );
            false
        }
    }

    async fn probe_root(&self) -> bool {
        match self.run("id").await {
            Some(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).contains("uid=0")
            }
            _ => false,
        }
    }
}

/// Quote a string for POSIX `sh` using single quotes.
pub fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chmod_command_quotes_path() {
        assert_eq!(
            SuChmod::chmod_command(Path::new("/sdcard/TermuxProjects/a b.sh"), 0o664),
            "chmod 664 '/sdcard/TermuxProjects/a b.sh'"
        );
        assert_eq!(
            SuChmod::chmod_command(Path::new("/x/it's.sh"), 0o775),
            r"chmod 775 '/x/it'\''s.sh'"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_apply_mode_via_shell() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("it's here.sh");
        std::fs::write(&file, "echo hi\n").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o600)).unwrap();

        // `sh -c <command>` runs the same command line as `su -c` would.
        let runner = SuChmod::new("sh");
        assert!(runner.apply_mode(&file, 0o664).await);

        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o664);
    }

    #[tokio::test]
    async fn test_missing_binary_reports_false() {
        let runner = SuChmod::new("/nonexistent/bin/su");
        assert!(!runner.apply_mode(Path::new("/tmp"), 0o775).await);
        assert!(!runner.probe_root().await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_reports_false() {
        let runner = SuChmod::new("sh");
        assert!(
            !runner
                .apply_mode(Path::new("/definitely/not/here"), 0o664)
                .await
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_root_matches_effective_uid() {
        let runner = SuChmod::new("sh");
        assert_eq!(runner.probe_root().await, nix::unistd::geteuid().is_root());
    }
}
