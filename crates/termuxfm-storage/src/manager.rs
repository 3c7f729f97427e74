//! Storage manager: owns the single active provider for a workspace selection.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use termuxfm_core::config::AppConfig;
use termuxfm_core::config::workspace::{WorkspaceConfig, WorkspaceMode};
use termuxfm_core::result::AppResult;
use termuxfm_core::traits::document::DocumentTree;
use termuxfm_core::traits::repair::PermissionRepair;
use termuxfm_core::traits::storage::StorageProvider;

use crate::prefs::PreferenceStore;
use crate::providers::{DirectStorageProvider, DocumentTreeStorageProvider, open_document_tree};
use crate::repair::{RepairHelper, SuChmod};

#[derive(Debug)]
struct ActiveWorkspace {
    config: WorkspaceConfig,
    provider: Arc<dyn StorageProvider>,
}

/// Central storage manager holding the active provider and its selection.
///
/// A provider is never patched: [`StorageManager::reconfigure`] builds a
/// fresh one and swaps it in. Callers holding an older `Arc` keep using
/// the provider they were handed.
#[derive(Debug, Clone)]
pub struct StorageManager {
    active: Arc<RwLock<ActiveWorkspace>>,
    repair: RepairHelper,
    /// Platform tree used for every SAF selection instead of opening the URI.
    tree_override: Option<Arc<dyn DocumentTree>>,
}

impl StorageManager {
    /// Create a manager for `config`.
    pub async fn new(config: WorkspaceConfig, repair: RepairHelper) -> AppResult<Self> {
        Self::build(config, repair, None).await
    }

    /// Create a manager whose SAF backend always uses `tree`.
    pub async fn with_document_tree(
        config: WorkspaceConfig,
        repair: RepairHelper,
        tree: Arc<dyn DocumentTree>,
    ) -> AppResult<Self> {
        Self::build(config, repair, Some(tree)).await
    }

    /// Startup wiring: build the repair helper from `[repair]`, pick the
    /// backend from the settings, then the persisted selection, then the
    /// root probe, and attach the persisted grant.
    pub async fn from_app_config(config: &AppConfig, prefs: &PreferenceStore) -> AppResult<Self> {
        let policy = config.repair.policy()?;
        let runner = Arc::new(SuChmod::from_config(&config.repair));

        let mut settings = config.workspace.clone();
        settings.mode = settings.mode.or_else(|| prefs.workspace_mode());

        let root_available = if settings.mode.is_none() && settings.probe_root {
            let available = runner.probe_root().await;
            debug!(available, su = %config.repair.su_binary, "Probed for root");
            available
        } else {
            false
        };

        let workspace = settings.resolve(root_available, prefs.tree_uri());
        Self::new(workspace, RepairHelper::new(runner, policy)).await
    }

    async fn build(
        config: WorkspaceConfig,
        repair: RepairHelper,
        tree_override: Option<Arc<dyn DocumentTree>>,
    ) -> AppResult<Self> {
        let provider = build_provider(&config, &repair, tree_override.as_ref()).await?;
        info!(
            mode = %config.mode,
            provider = provider.provider_type(),
            "Storage workspace initialized"
        );
        Ok(Self {
            active: Arc::new(RwLock::new(ActiveWorkspace { config, provider })),
            repair,
            tree_override,
        })
    }

    /// The active provider.
    pub async fn current(&self) -> Arc<dyn StorageProvider> {
        self.active.read().await.provider.clone()
    }

    /// The active workspace selection.
    pub async fn config(&self) -> WorkspaceConfig {
        self.active.read().await.config.clone()
    }

    /// The permission repair helper shared by the direct backend.
    pub fn repair(&self) -> &RepairHelper {
        &self.repair
    }

    /// Replace the workspace selection. The new provider is built before
    /// the swap, so a failure leaves the previous one active.
    pub async fn reconfigure(&self, config: WorkspaceConfig) -> AppResult<Arc<dyn StorageProvider>> {
        let provider = build_provider(&config, &self.repair, self.tree_override.as_ref()).await?;

        let mut active = self.active.write().await;
        info!(
            from = %active.config.mode,
            to = %config.mode,
            provider = provider.provider_type(),
            "Storage workspace reconfigured"
        );
        active.config = config;
        active.provider = provider.clone();
        Ok(provider)
    }
}

async fn build_provider(
    config: &WorkspaceConfig,
    repair: &RepairHelper,
    tree_override: Option<&Arc<dyn DocumentTree>>,
) -> AppResult<Arc<dyn StorageProvider>> {
    match config.mode {
        WorkspaceMode::Direct => {
            let provider =
                DirectStorageProvider::new(&config.legacy_root_path, repair.clone()).await?;
            Ok(Arc::new(provider))
        }
        WorkspaceMode::Saf => {
            let Some(uri) = config.saf_tree_uri.as_deref() else {
                debug!("No document tree granted yet");
                return Ok(Arc::new(DocumentTreeStorageProvider::unbound()));
            };
            let tree = match tree_override {
                Some(tree) => tree.clone(),
                None => open_document_tree(uri)?,
            };
            Ok(Arc::new(DocumentTreeStorageProvider::new(tree)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryDocumentTree;

    #[tokio::test]
    async fn test_direct_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("TermuxProjects");
        let config = WorkspaceConfig::direct(&root.to_string_lossy());

        let manager = StorageManager::new(config, RepairHelper::disabled()).await.unwrap();
        assert!(root.is_dir());
        let provider = manager.current().await;
        assert_eq!(provider.provider_type(), "direct");
        assert!(provider.is_ready().await);
    }

    #[tokio::test]
    async fn test_saf_without_grant_is_not_ready() {
        let config = WorkspaceConfig::choose(true, None, "/unused");
        let manager = StorageManager::new(config, RepairHelper::disabled()).await.unwrap();
        let provider = manager.current().await;
        assert_eq!(provider.provider_type(), "document-tree");
        assert!(!provider.is_ready().await);
        assert!(!manager.config().await.is_usable());
    }

    #[tokio::test]
    async fn test_reconfigure_swaps_provider() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkspaceConfig::choose(true, None, &dir.path().to_string_lossy());
        let tree = Arc::new(MemoryDocumentTree::new());
        let manager =
            StorageManager::with_document_tree(config.clone(), RepairHelper::disabled(), tree)
                .await
                .unwrap();

        let before = manager.current().await;
        let granted = config.with_tree_uri("content://tree/primary");
        manager.reconfigure(granted.clone()).await.unwrap();
        assert_eq!(manager.config().await, granted);
        assert!(manager.current().await.is_ready().await);
        // The old handle is untouched.
        assert!(!before.is_ready().await);

        manager.reconfigure(granted.fallback_to_direct()).await.unwrap();
        assert_eq!(manager.current().await.provider_type(), "direct");
    }

    #[tokio::test]
    async fn test_startup_follows_persisted_selection() {
        let dir = tempfile::tempdir().unwrap();
        let tree_root = dir.path().join("tree");
        std::fs::create_dir(&tree_root).unwrap();
        let uri = url::Url::from_directory_path(&tree_root).unwrap().to_string();

        let mut config = AppConfig::default();
        config.workspace.probe_root = false;
        config.workspace.legacy_root_path = dir.path().join("direct").to_string_lossy().into_owned();

        let mut prefs = PreferenceStore::load(dir.path().join("prefs.json")).await.unwrap();
        prefs.persist_tree_permission(&uri).await.unwrap();

        // Without a saved selection and without root the grant is ignored.
        let manager = StorageManager::from_app_config(&config, &prefs).await.unwrap();
        assert_eq!(manager.config().await.mode, WorkspaceMode::Direct);

        prefs.persist_workspace_mode(WorkspaceMode::Saf).await.unwrap();
        let manager = StorageManager::from_app_config(&config, &prefs).await.unwrap();
        assert_eq!(manager.config().await.saf_tree_uri.as_deref(), Some(uri.as_str()));
        let provider = manager.current().await;
        assert_eq!(provider.provider_type(), "document-tree");
        assert!(provider.is_ready().await);

        // A mode forced in the configuration wins over the saved one.
        config.workspace.mode = Some(WorkspaceMode::Direct);
        let manager = StorageManager::from_app_config(&config, &prefs).await.unwrap();
        assert_eq!(manager.current().await.provider_type(), "direct");
    }

    #[tokio::test]
    async fn test_failed_reconfigure_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkspaceConfig::direct(&dir.path().to_string_lossy());
        let manager = StorageManager::new(config.clone(), RepairHelper::disabled())
            .await
            .unwrap();

        let err = manager
            .reconfigure(config.with_tree_uri("content://tree/primary"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, termuxfm_core::error::ErrorKind::Configuration);
        assert_eq!(manager.config().await, config);
        assert_eq!(manager.current().await.provider_type(), "direct");
    }
}
