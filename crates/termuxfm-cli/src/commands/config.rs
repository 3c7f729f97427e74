//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use termuxfm_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path)?;
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                let mode = config
                    .workspace
                    .mode
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "auto".to_string());
                output::print_success(&format!("Configuration '{config_path}' is valid"));
                output::print_kv("Workspace mode", &mode);
                output::print_kv("Direct root", &config.workspace.legacy_root_path);
                output::print_kv("Preferences", &config.workspace.preferences_path);
                output::print_kv("Repair enabled", &config.repair.enabled.to_string());
                output::print_kv("Superuser binary", &config.repair.su_binary);
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
            {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::from_io(e, format!("Failed to create {}", parent.display()))
                })?;
            }

            tokio::fs::write(out_path, default_config)
                .await
                .map_err(|e| AppError::from_io(e, format!("Failed to write {out_path}")))?;

            output::print_success(&format!("Default config written to '{out_path}'"));
        }
    }

    Ok(())
}
