//! CLI command definitions and dispatch.

pub mod config;
pub mod files;
pub mod scripts;
pub mod workspace;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use termuxfm_core::config::AppConfig;
use termuxfm_core::error::AppError;
use termuxfm_core::traits::storage::StorageProvider;
use termuxfm_storage::{PreferenceStore, StorageManager};

/// Termux File Manager: browse and edit a Termux workspace from the shell
#[derive(Debug, Parser)]
#[command(name = "termux-fm", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List a directory
    Ls(files::LsArgs),
    /// Print a file
    Cat(files::CatArgs),
    /// Replace a file's content
    Write(files::WriteArgs),
    /// Create a directory
    Mkdir(files::CreateArgs),
    /// Create an empty file
    Touch(files::CreateArgs),
    /// Delete a file or a directory tree
    Rm(files::RmArgs),
    /// Rename an entry within its directory
    Rename(files::RenameArgs),
    /// Make every script below a directory executable
    FixPerms(scripts::FixPermsArgs),
    /// Create a script from a template
    NewScript(scripts::NewScriptArgs),
    /// Workspace backend selection
    Workspace(workspace::WorkspaceArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let format = self.format;
        match &self.command {
            Commands::Ls(args) => files::ls(args, &self.config, format).await,
            Commands::Cat(args) => files::cat(args, &self.config).await,
            Commands::Write(args) => files::write(args, &self.config).await,
            Commands::Mkdir(args) => files::mkdir(args, &self.config).await,
            Commands::Touch(args) => files::touch(args, &self.config).await,
            Commands::Rm(args) => files::rm(args, &self.config).await,
            Commands::Rename(args) => files::rename(args, &self.config).await,
            Commands::FixPerms(args) => scripts::fix_perms(args, &self.config, format).await,
            Commands::NewScript(args) => scripts::new_script(args, &self.config).await,
            Commands::Workspace(args) => workspace::execute(args, &self.config, format).await,
            Commands::Config(args) => config::execute(args, &self.config, format).await,
        }
    }
}

/// Everything a storage command needs, wired from the config file.
pub struct Session {
    pub config: AppConfig,
    pub prefs: PreferenceStore,
    pub manager: StorageManager,
}

impl Session {
    /// The active provider, failing early while no document tree is granted.
    pub async fn ready_provider(&self) -> Result<Arc<dyn StorageProvider>, AppError> {
        let provider = self.manager.current().await;
        if !provider.is_ready().await {
            return Err(AppError::backend_unavailable(
                "Workspace is not ready; grant a tree with `termux-fm workspace grant <URI>` \
                 or switch with `termux-fm workspace use-direct`",
            ));
        }
        Ok(provider)
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: load configuration, preferences and the storage manager
pub async fn open_session(config_path: &str) -> Result<Session, AppError> {
    let config = load_config(config_path)?;
    let prefs = PreferenceStore::load(&config.workspace.preferences_path).await?;
    let manager = StorageManager::from_app_config(&config, &prefs).await?;
    tracing::debug!(config = %config_path, prefs = %prefs.path().display(), "Session opened");
    Ok(Session {
        config,
        prefs,
        manager,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_commands() {
        let cli = Cli::try_parse_from(["termux-fm", "--format", "json", "mkdir", "/Scripts", "--exist-ok"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Mkdir(args) => {
                assert_eq!(args.path, "/Scripts");
                assert!(args.exist_ok);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["termux-fm", "ls"]).unwrap();
        assert_eq!(cli.config, "config/default.toml");
        assert!(matches!(cli.command, Commands::Ls(ref args) if args.path == "/"));
    }

    #[test]
    fn test_parse_workspace_grant() {
        let cli = Cli::try_parse_from(["termux-fm", "workspace", "grant", "file:///sdcard/P"]).unwrap();
        match cli.command {
            Commands::Workspace(args) => assert!(matches!(
                args.command,
                workspace::WorkspaceCommand::Grant { ref uri } if uri == "file:///sdcard/P"
            )),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
