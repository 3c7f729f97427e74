//! Repair policy applied at the point of failure.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use termuxfm_core::config::repair::RepairPolicy;
use termuxfm_core::traits::repair::PermissionRepair;

/// The access an operation needs on its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read a file, or list a directory.
    Read,
    /// Write a file, or add/remove entries of a directory.
    Write,
    /// Both of the above.
    ReadWrite,
}

/// Stateless best-effort permission repair.
///
/// Holds the privileged runner and the policy deciding which mode to
/// apply. Callers invoke [`RepairHelper::repair`] once, after an operation
/// failed with a permission error, and retry only if it returns `true`.
#[derive(Debug, Clone)]
pub struct RepairHelper {
    runner: Option<Arc<dyn PermissionRepair>>,
    policy: RepairPolicy,
}

impl RepairHelper {
    /// Create a helper around a privileged runner.
    pub fn new(runner: Arc<dyn PermissionRepair>, policy: RepairPolicy) -> Self {
        Self {
            runner: Some(runner),
            policy,
        }
    }

    /// A helper that never repairs anything.
    pub fn disabled() -> Self {
        Self {
            runner: None,
            policy: RepairPolicy::disabled(),
        }
    }

    /// The active repair policy.
    pub fn policy(&self) -> &RepairPolicy {
        &self.policy
    }

    /// Whether a repair can be attempted at all.
    pub fn is_enabled(&self) -> bool {
        self.policy.enabled && self.runner.is_some()
    }

    /// Check `access` on `target` and run [`RepairHelper::repair`] when it
    /// is missing. The runner is invoked at most once.
    pub async fn ensure(&self, target: &Path, is_directory: bool, access: Access) -> bool {
        if is_accessible(target, is_directory, access).await {
            return true;
        }
        self.repair(target, is_directory, access).await
    }

    /// Apply the policy mode to `target` and report whether `access` is
    /// now granted. Never fails; `false` means "still inaccessible".
    pub async fn repair(&self, target: &Path, is_directory: bool, access: Access) -> bool {
        let mode = self.policy.mode_for(is_directory);
        if !self.run(target, mode).await {
            return false;
        }
        let granted = is_accessible(target, is_directory, access).await;
        if !granted {
            warn!(
                path = %target.display(),
                mode = %format!("{mode:o}"),
                "Permission repair ran but access is still denied"
            );
        }
        granted
    }

    /// Apply the script mode to `target`. Used by the bulk script sweep.
    pub async fn apply_script_mode(&self, target: &Path) -> bool {
        self.run(target, self.policy.script_mode).await
    }

    async fn run(&self, target: &Path, mode: u32) -> bool {
        let Some(runner) = self.runner.as_ref().filter(|_| self.policy.enabled) else {
            debug!(path = %target.display(), "Permission repair disabled");
            return false;
        };

        let ok = runner.apply_mode(target, mode).await;
        if ok {
            debug!(
                path = %target.display(),
                mode = %format!("{mode:o}"),
                runner = runner.name(),
                "Repaired permissions"
            );
        } else {
            warn!(
                path = %target.display(),
                mode = %format!("{mode:o}"),
                runner = runner.name(),
                "Permission repair failed"
            );
        }
        ok
    }
}

/// Check whether the current process has `access` on `path`.
///
/// Directories additionally need the search bit for any access.
pub async fn is_accessible(path: &Path, is_directory: bool, access: Access) -> bool {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || check_access(&path, is_directory, access))
        .await
        .unwrap_or(false)
}

#[cfg(unix)]
fn check_access(path: &Path, is_directory: bool, access: Access) -> bool {
    use nix::unistd::AccessFlags;

    let mut flags = match access {
        Access::Read => AccessFlags::R_OK,
        Access::Write => AccessFlags::W_OK,
        Access::ReadWrite => AccessFlags::R_OK | AccessFlags::W_OK,
    };
    if is_directory {
        flags |= AccessFlags::X_OK;
    }
    nix::unistd::access(path, flags).is_ok()
}

#[cfg(not(unix))]
fn check_access(path: &Path, _is_directory: bool, access: Access) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => access == Access::Read || !meta.permissions().readonly(),
        Err(_) => false,
    }
}
