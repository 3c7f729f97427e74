//! Workspace backend selection.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which storage backend serves the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceMode {
    /// A user-granted document tree.
    Saf,
    /// A directory on the host filesystem.
    Direct,
}

impl std::fmt::Display for WorkspaceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Saf => write!(f, "saf"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

impl std::str::FromStr for WorkspaceMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saf" => Ok(Self::Saf),
            "direct" => Ok(Self::Direct),
            other => Err(AppError::configuration(format!(
                "Unknown workspace mode '{other}', expected 'saf' or 'direct'"
            ))),
        }
    }
}

/// The `[workspace]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Forced backend. When absent the root probe decides.
    #[serde(default)]
    pub mode: Option<WorkspaceMode>,
    /// Tree URI to use instead of the persisted grant.
    #[serde(default)]
    pub saf_tree_uri: Option<String>,
    /// Root directory of the direct-filesystem backend.
    #[serde(default = "default_legacy_root")]
    pub legacy_root_path: String,
    /// JSON file holding persisted preferences such as the granted tree URI.
    #[serde(default = "default_preferences_path")]
    pub preferences_path: String,
    /// Whether to probe for a working superuser binary at startup.
    #[serde(default = "default_true")]
    pub probe_root: bool,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            mode: None,
            saf_tree_uri: None,
            legacy_root_path: default_legacy_root(),
            preferences_path: default_preferences_path(),
            probe_root: true,
        }
    }
}

impl WorkspaceSettings {
    /// Derive the active [`WorkspaceConfig`].
    ///
    /// A forced `mode` wins; otherwise [`WorkspaceConfig::choose`] applies.
    /// A configured tree URI takes precedence over the persisted one.
    pub fn resolve(&self, root_available: bool, saved_tree_uri: Option<String>) -> WorkspaceConfig {
        let tree_uri = self.saf_tree_uri.clone().or(saved_tree_uri);
        match self.mode {
            Some(WorkspaceMode::Direct) => WorkspaceConfig::direct(&self.legacy_root_path),
            Some(WorkspaceMode::Saf) => WorkspaceConfig {
                mode: WorkspaceMode::Saf,
                saf_tree_uri: tree_uri,
                legacy_root_path: self.legacy_root_path.clone(),
            },
            None => WorkspaceConfig::choose(root_available, tree_uri, &self.legacy_root_path),
        }
    }
}

/// The active workspace selection.
///
/// Values are replaced, never mutated: granting a tree or falling back to
/// direct mode produces a new `WorkspaceConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Active backend.
    pub mode: WorkspaceMode,
    /// Granted tree URI, only meaningful in SAF mode.
    pub saf_tree_uri: Option<String>,
    /// Root of the direct-filesystem backend.
    pub legacy_root_path: String,
}

impl WorkspaceConfig {
    /// Direct-filesystem workspace rooted at `root`.
    pub fn direct(root: &str) -> Self {
        Self {
            mode: WorkspaceMode::Direct,
            saf_tree_uri: None,
            legacy_root_path: root.to_string(),
        }
    }

    /// Startup selection: without root the direct backend is used,
    /// with root the document tree (possibly not granted yet).
    pub fn choose(root_available: bool, saved_tree_uri: Option<String>, legacy_root: &str) -> Self {
        if root_available {
            Self {
                mode: WorkspaceMode::Saf,
                saf_tree_uri: saved_tree_uri,
                legacy_root_path: legacy_root.to_string(),
            }
        } else {
            Self::direct(legacy_root)
        }
    }

    /// The same workspace with a freshly granted document tree.
    pub fn with_tree_uri(&self, uri: impl Into<String>) -> Self {
        Self {
            mode: WorkspaceMode::Saf,
            saf_tree_uri: Some(uri.into()),
            legacy_root_path: self.legacy_root_path.clone(),
        }
    }

    /// The same workspace switched to the direct-filesystem backend.
    pub fn fallback_to_direct(&self) -> Self {
        Self::direct(&self.legacy_root_path)
    }

    /// False while SAF mode waits for a tree grant.
    pub fn is_usable(&self) -> bool {
        !(self.mode == WorkspaceMode::Saf && self.saf_tree_uri.is_none())
    }
}

fn default_legacy_root() -> String {
    "/sdcard/TermuxProjects".to_string()
}

fn default_preferences_path() -> String {
    "./data/termuxfm-prefs.json".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_without_root_is_direct() {
        let cfg = WorkspaceConfig::choose(false, Some("file:///x".into()), "/sdcard/P");
        assert_eq!(cfg.mode, WorkspaceMode::Direct);
        assert_eq!(cfg.saf_tree_uri, None);
        assert!(cfg.is_usable());
    }

    #[test]
    fn test_saf_without_grant_is_not_usable() {
        let cfg = WorkspaceConfig::choose(true, None, "/sdcard/P");
        assert_eq!(cfg.mode, WorkspaceMode::Saf);
        assert!(!cfg.is_usable());

        let granted = cfg.with_tree_uri("file:///tree");
        assert!(granted.is_usable());
        // The original value is untouched.
        assert!(!cfg.is_usable());

        let direct = granted.fallback_to_direct();
        assert_eq!(direct, WorkspaceConfig::direct("/sdcard/P"));
    }

    #[test]
    fn test_mode_parses_its_display_form() {
        for mode in [WorkspaceMode::Saf, WorkspaceMode::Direct] {
            assert_eq!(mode.to_string().parse::<WorkspaceMode>().unwrap(), mode);
        }
        assert!("sideways".parse::<WorkspaceMode>().is_err());
    }

    #[test]
    fn test_forced_mode_overrides_probe() {
        let settings = WorkspaceSettings {
            mode: Some(WorkspaceMode::Direct),
            ..WorkspaceSettings::default()
        };
        let cfg = settings.resolve(true, Some("file:///tree".into()));
        assert_eq!(cfg.mode, WorkspaceMode::Direct);

        let settings = WorkspaceSettings {
            mode: Some(WorkspaceMode::Saf),
            saf_tree_uri: Some("file:///configured".into()),
            ..WorkspaceSettings::default()
        };
        let cfg = settings.resolve(false, Some("file:///saved".into()));
        assert_eq!(cfg.saf_tree_uri.as_deref(), Some("file:///configured"));
    }
}
