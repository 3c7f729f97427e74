//! Persisted key-value preferences.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use termuxfm_core::config::workspace::WorkspaceMode;
use termuxfm_core::error::AppError;
use termuxfm_core::result::AppResult;

/// Key holding the granted document tree URI.
pub const SAF_TREE_URI_KEY: &str = "saf_tree_uri";

/// Key holding the backend the user last switched to.
pub const WORKSPACE_MODE_KEY: &str = "workspace_mode";

/// A JSON file of string preferences, read once and written on change.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    /// Load preferences from `path`. A missing file yields an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let values = match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No preference file, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                return Err(AppError::from_io(
                    e,
                    format!("Failed to read preferences: {}", path.display()),
                ));
            }
        };
        Ok(Self { path, values })
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Write the store back to its file, creating parent directories.
    pub async fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::from_io(
                    e,
                    format!("Failed to create preference directory: {}", parent.display()),
                )
            })?;
        }
        let raw = serde_json::to_vec_pretty(&self.values)?;
        fs::write(&self.path, raw).await.map_err(|e| {
            AppError::from_io(
                e,
                format!("Failed to write preferences: {}", self.path.display()),
            )
        })
    }

    /// The persisted document tree grant.
    pub fn tree_uri(&self) -> Option<String> {
        self.get(SAF_TREE_URI_KEY).map(str::to_string)
    }

    /// Persist a document tree grant.
    pub async fn persist_tree_permission(&mut self, uri: &str) -> AppResult<()> {
        self.set(SAF_TREE_URI_KEY, uri);
        self.save().await?;
        info!(uri = %uri, "Persisted document tree grant");
        Ok(())
    }

    /// Drop the persisted document tree grant.
    pub async fn forget_tree_permission(&mut self) -> AppResult<()> {
        if self.remove(SAF_TREE_URI_KEY).is_some() {
            self.save().await?;
            info!("Forgot document tree grant");
        }
        Ok(())
    }

    /// The backend the user last selected, if any. Unknown values are
    /// ignored so that auto-selection applies.
    pub fn workspace_mode(&self) -> Option<WorkspaceMode> {
        let raw = self.get(WORKSPACE_MODE_KEY)?;
        match raw.parse() {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring persisted workspace mode");
                None
            }
        }
    }

    /// Persist the selected backend for the next launch.
    pub async fn persist_workspace_mode(&mut self, mode: WorkspaceMode) -> AppResult<()> {
        self.set(WORKSPACE_MODE_KEY, mode.to_string());
        self.save().await?;
        info!(mode = %mode, "Persisted workspace selection");
        Ok(())
    }

    /// Drop the persisted backend selection.
    pub async fn forget_workspace_mode(&mut self) -> AppResult<()> {
        if self.remove(WORKSPACE_MODE_KEY).is_some() {
            self.save().await?;
        }
        Ok(())
    }
}
