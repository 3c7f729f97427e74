//! Workspace backend selection commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{self, OutputFormat};
use termuxfm_core::config::workspace::WorkspaceMode;
use termuxfm_core::error::AppError;

/// Arguments for workspace commands
#[derive(Debug, Args)]
pub struct WorkspaceArgs {
    /// Workspace subcommand
    #[command(subcommand)]
    pub command: WorkspaceCommand,
}

/// Workspace subcommands
#[derive(Debug, Subcommand)]
pub enum WorkspaceCommand {
    /// Show the active backend
    Status,
    /// Persist a document tree grant and switch to it
    Grant {
        /// Tree URI, e.g. `file:///sdcard/Projects`
        uri: String,
    },
    /// Drop the persisted document tree grant
    Forget,
    /// Switch to the direct-filesystem backend
    UseDirect,
}

/// Workspace status for display
#[derive(Debug, Serialize)]
struct WorkspaceStatus {
    mode: WorkspaceMode,
    provider: String,
    ready: bool,
    usable: bool,
    saf_tree_uri: Option<String>,
    legacy_root_path: String,
    repair_enabled: bool,
}

/// Execute workspace commands
pub async fn execute(
    args: &WorkspaceArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mut session = super::open_session(config_path).await?;

    match &args.command {
        WorkspaceCommand::Status => {}
        WorkspaceCommand::Grant { uri } => {
            let granted = session.manager.config().await.with_tree_uri(uri.as_str());
            // Only persist a grant that can actually be opened.
            session.manager.reconfigure(granted).await?;
            session.prefs.persist_tree_permission(uri).await?;
            session
                .prefs
                .persist_workspace_mode(WorkspaceMode::Saf)
                .await?;
            output::print_success(&format!("Granted document tree {uri}"));
            warn_if_forced(&session, WorkspaceMode::Saf);
        }
        WorkspaceCommand::Forget => {
            session.prefs.forget_tree_permission().await?;
            if session.prefs.workspace_mode() == Some(WorkspaceMode::Saf) {
                session.prefs.forget_workspace_mode().await?;
            }
            output::print_success("Forgot the document tree grant");
            if session.config.workspace.saf_tree_uri.is_some() {
                output::print_warning("workspace.saf_tree_uri is still set in the configuration");
            }
            return Ok(());
        }
        WorkspaceCommand::UseDirect => {
            let direct = session.manager.config().await.fallback_to_direct();
            session.manager.reconfigure(direct).await?;
            session
                .prefs
                .persist_workspace_mode(WorkspaceMode::Direct)
                .await?;
            output::print_success("Switched to the direct-filesystem workspace");
            warn_if_forced(&session, WorkspaceMode::Direct);
        }
    }

    print_status(&session, format).await;
    Ok(())
}

/// The saved selection only applies while the configuration leaves
/// `workspace.mode` unset.
fn warn_if_forced(session: &super::Session, selected: WorkspaceMode) {
    if let Some(forced) = session.config.workspace.mode.filter(|m| *m != selected) {
        output::print_warning(&format!(
            "workspace.mode = \"{forced}\" in the configuration overrides this selection on the next run"
        ));
    }
}

async fn print_status(session: &super::Session, format: OutputFormat) {
    let config = session.manager.config().await;
    let provider = session.manager.current().await;
    let status = WorkspaceStatus {
        mode: config.mode,
        provider: provider.provider_type().to_string(),
        ready: provider.is_ready().await,
        usable: config.is_usable(),
        saf_tree_uri: config.saf_tree_uri.clone(),
        legacy_root_path: config.legacy_root_path.clone(),
        repair_enabled: session.manager.repair().is_enabled(),
    };

    match format {
        OutputFormat::Json => output::print_item(&status, format),
        OutputFormat::Table => {
            output::print_kv("Mode", &status.mode.to_string());
            output::print_kv("Provider", &status.provider);
            output::print_kv("Ready", &status.ready.to_string());
            output::print_kv(
                "Tree URI",
                status.saf_tree_uri.as_deref().unwrap_or("(not granted)"),
            );
            output::print_kv("Direct root", &status.legacy_root_path);
            output::print_kv("Permission repair", &status.repair_enabled.to_string());
            if !status.usable {
                output::print_warning("No document tree granted yet");
            }
        }
    }
}
