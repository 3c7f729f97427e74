//! Application configuration schemas.
//!
//! All configuration structs are deserialized from an optional TOML file
//! plus `TERMUXFM__`-prefixed environment variables via the `config`
//! crate. Each sub-module represents a logical configuration section.

pub mod logging;
pub mod repair;
pub mod scripts;
pub mod workspace;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::repair::RepairConfig;
use self::scripts::ScriptsConfig;
use self::workspace::WorkspaceSettings;

use crate::error::AppError;

/// Root application configuration.
///
/// Every section has defaults, so an absent file yields a usable
/// configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace backend selection.
    #[serde(default)]
    pub workspace: WorkspaceSettings,
    /// Permission repair policy.
    #[serde(default)]
    pub repair: RepairConfig,
    /// Script templates and detection.
    #[serde(default)]
    pub scripts: ScriptsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional. Environment variables prefixed with
    /// `TERMUXFM__` (section and key separated by `__`) override it.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TERMUXFM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.repair.policy()?;
        if self.workspace.legacy_root_path.trim().is_empty() {
            return Err(AppError::configuration(
                "workspace.legacy_root_path must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.workspace.legacy_root_path, "/sdcard/TermuxProjects");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist/termuxfm").unwrap();
        assert!(config.repair.enabled);
        assert_eq!(config.repair.su_binary, "su");
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let raw = r#"
            [workspace]
            mode = "direct"
            legacy_root_path = "/tmp/projects"

            [repair]
            file_mode = "644"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(
            config.workspace.mode,
            Some(workspace::WorkspaceMode::Direct)
        );
        assert_eq!(config.workspace.legacy_root_path, "/tmp/projects");
        assert_eq!(config.repair.policy().unwrap().file_mode, 0o644);
        assert_eq!(config.repair.directory_mode, "775");
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[workspace]\nmode = \"sideways\"\n").unwrap();

        let err = AppConfig::load(&path.to_string_lossy()).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
        assert!(err.source.is_some());
    }
}
