//! Bulk executable-bit sweep over the scripts of a workspace subtree.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use termuxfm_core::path;
use termuxfm_core::result::AppResult;
use termuxfm_core::scripts::is_script;
use termuxfm_core::traits::storage::StorageProvider;

use crate::repair::RepairHelper;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Script files found.
    pub scanned: usize,
    /// Scripts that are executable after the sweep.
    pub fixed: usize,
    /// Scripts that could not be made executable.
    pub failed: usize,
}

/// Makes every script below a directory executable.
///
/// Per-file failures are counted and the sweep continues; only a failure
/// to list the tree itself aborts it.
#[derive(Debug, Clone)]
pub struct ScriptPermissionSweep {
    provider: Arc<dyn StorageProvider>,
    repair: RepairHelper,
}

impl ScriptPermissionSweep {
    pub fn new(provider: Arc<dyn StorageProvider>, repair: RepairHelper) -> Self {
        Self { provider, repair }
    }

    /// Sweep the subtree at the logical path `root`.
    pub async fn run(&self, root: &str) -> AppResult<SweepReport> {
        let logical = path::normalize(root)?;
        let mut visited = HashSet::new();
        let mut scripts = Vec::new();
        self.collect(logical.clone(), &mut visited, &mut scripts)
            .await?;

        let mut report = SweepReport {
            scanned: scripts.len(),
            ..SweepReport::default()
        };
        for script in &scripts {
            if self.make_executable(script).await {
                report.fixed += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            root = %logical,
            scanned = report.scanned,
            fixed = report.fixed,
            failed = report.failed,
            "Script permission sweep finished"
        );
        Ok(report)
    }

    /// Walk `dir` depth-first. Directories reached twice through symlinks
    /// are walked once, keyed by their canonical host path.
    fn collect<'a>(
        &'a self,
        dir: String,
        visited: &'a mut HashSet<PathBuf>,
        scripts: &'a mut Vec<String>,
    ) -> BoxFuture<'a, AppResult<()>> {
        async move {
            if let Some(key) = self.canonical_dir(&dir).await {
                if !visited.insert(key) {
                    debug!(path = %dir, "Directory already swept, skipping");
                    return Ok(());
                }
            }
            for item in self.provider.list(&dir).await? {
                if item.is_directory {
                    self.collect(item.path, &mut *visited, &mut *scripts)
                        .await?;
                } else if is_script(&item.path) {
                    scripts.push(item.path);
                }
            }
            Ok(())
        }
        .boxed()
    }

    async fn canonical_dir(&self, logical: &str) -> Option<PathBuf> {
        let host = self.provider.absolute_path(logical).await.ok().flatten()?;
        tokio::fs::canonicalize(&host).await.ok()
    }

    /// Make one script executable: set the executable bits directly, or
    /// fall back to the privileged runner with the script mode.
    pub async fn make_executable(&self, logical: &str) -> bool {
        let host = match self.provider.absolute_path(logical).await {
            Ok(Some(host)) => host,
            Ok(None) => {
                debug!(path = %logical, "No host path, cannot set executable bits");
                return false;
            }
            Err(e) => {
                warn!(path = %logical, error = %e, "Failed to resolve script");
                return false;
            }
        };

        if set_executable(&host).await {
            return true;
        }
        self.repair.apply_script_mode(&host).await
    }
}

#[cfg(unix)]
async fn set_executable(host: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    let meta = match tokio::fs::metadata(host).await {
        Ok(meta) => meta,
        Err(e) => {
            debug!(path = %host.display(), error = %e, "Cannot stat script");
            return false;
        }
    };
    let mode = meta.permissions().mode();
    if mode & 0o111 == 0o111 {
        return true;
    }
    match tokio::fs::set_permissions(host, std::fs::Permissions::from_mode(mode | 0o111)).await {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %host.display(), error = %e, "chmod failed, falling back to repair");
            false
        }
    }
}

#[cfg(not(unix))]
async fn set_executable(_host: &Path) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    use crate::providers::{DirectStorageProvider, DocumentTreeStorageProvider, MemoryDocumentTree};

    fn mode_of(path: &Path) -> u32 {
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[tokio::test]
    async fn test_sweep_marks_scripts_executable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DirectStorageProvider::new(dir.path(), RepairHelper::disabled())
            .await
            .unwrap();
        provider.write_file("/a.sh", "echo a\n").await.unwrap();
        provider.write_file("/nested/b.py", "print(1)\n").await.unwrap();
        provider.write_file("/notes.txt", "plain\n").await.unwrap();
        std::fs::set_permissions(dir.path().join("a.sh"), std::fs::Permissions::from_mode(0o644))
            .unwrap();

        let sweep = ScriptPermissionSweep::new(Arc::new(provider), RepairHelper::disabled());
        let report = sweep.run("/").await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                scanned: 2,
                fixed: 2,
                failed: 0
            }
        );
        assert_eq!(mode_of(&dir.path().join("a.sh")), 0o755);
        assert_eq!(mode_of(&dir.path().join("notes.txt")) & 0o111, 0);
    }

    #[tokio::test]
    async fn test_symlinked_directories_are_swept_once() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DirectStorageProvider::new(dir.path(), RepairHelper::disabled())
            .await
            .unwrap();
        provider.write_file("/run.sh", "echo run\n").await.unwrap();
        provider.write_file("/lib/util.sh", "echo util\n").await.unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("self")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("lib"), dir.path().join("lib-alias")).unwrap();

        let sweep = ScriptPermissionSweep::new(Arc::new(provider), RepairHelper::disabled());
        let report = sweep.run("/").await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                scanned: 2,
                fixed: 2,
                failed: 0
            }
        );
        assert_eq!(mode_of(&dir.path().join("lib/util.sh")) & 0o111, 0o111);
    }

    #[tokio::test]
    async fn test_scripts_without_host_path_count_as_failed() {
        let provider = DocumentTreeStorageProvider::new(Arc::new(MemoryDocumentTree::new()));
        provider.write_file("/run.sh", "echo\n").await.unwrap();

        let sweep = ScriptPermissionSweep::new(Arc::new(provider), RepairHelper::disabled());
        let report = sweep.run("/").await.unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.failed, 1);
    }
}
