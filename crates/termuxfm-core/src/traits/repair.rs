//! Privileged permission repair capability.

use std::path::Path;

use async_trait::async_trait;

/// A narrow capability that changes mode bits with elevated privileges.
///
/// Implementations never fail loudly: any launch failure, denial or
/// non-zero exit is reported as `false`.
#[async_trait]
pub trait PermissionRepair: Send + Sync + std::fmt::Debug + 'static {
    /// Name of the mechanism, for logs.
    fn name(&self) -> &str;

    /// Apply `mode` to `target`. Returns whether the command succeeded.
    async fn apply_mode(&self, target: &Path, mode: u32) -> bool;

    /// Whether the privileged path works at all.
    async fn probe_root(&self) -> bool;
}
