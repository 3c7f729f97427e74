//! Script commands: executable-bit sweep and templates.

use clap::Args;

use crate::output::{self, OutputFormat};
use termuxfm_core::error::AppError;
use termuxfm_core::path;
use termuxfm_core::scripts::script_template;
use termuxfm_storage::ScriptPermissionSweep;

/// Arguments for `fix-perms`
#[derive(Debug, Args)]
pub struct FixPermsArgs {
    /// Logical directory to sweep
    #[arg(default_value = "/")]
    pub path: String,
}

/// Arguments for `new-script`
#[derive(Debug, Args)]
pub struct NewScriptArgs {
    /// Logical directory for the script
    pub dir: String,
    /// Script name; `.sh` is added when it has no extension
    pub name: String,
}

pub async fn fix_perms(
    args: &FixPermsArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let session = super::open_session(config_path).await?;
    let provider = session.ready_provider().await?;
    let sweep = ScriptPermissionSweep::new(provider, session.manager.repair().clone());
    let report = sweep.run(&args.path).await?;

    match format {
        OutputFormat::Json => output::print_item(&report, format),
        OutputFormat::Table => {
            output::print_success(&format!("Swept scripts below {}", args.path));
            output::print_kv("Scanned", &report.scanned.to_string());
            output::print_kv("Executable", &report.fixed.to_string());
            output::print_kv("Failed", &report.failed.to_string());
        }
    }
    Ok(())
}

pub async fn new_script(args: &NewScriptArgs, config_path: &str) -> Result<(), AppError> {
    path::validate_name(&args.name)?;
    let session = super::open_session(config_path).await?;
    let provider = session.ready_provider().await?;

    let (file_name, body) = script_template(&args.name, &session.config.scripts.interpreter_prefix);
    let dir = path::normalize(&args.dir)?;
    let target = path::join(&dir, &file_name);

    provider.create_file(&target).await?;
    provider.write_file(&target, &body).await?;

    let sweep = ScriptPermissionSweep::new(provider, session.manager.repair().clone());
    if sweep.make_executable(&target).await {
        output::print_success(&format!("Created {target}"));
    } else {
        output::print_warning(&format!("Created {target}, but could not make it executable"));
    }
    Ok(())
}
