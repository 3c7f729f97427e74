//! File and directory commands against the active workspace.

use clap::Args;
use tokio::io::AsyncReadExt;

use crate::output::{self, OutputFormat};
use termuxfm_core::error::{AppError, ErrorKind};

/// Arguments for `ls`
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Logical directory path
    #[arg(default_value = "/")]
    pub path: String,
}

/// Arguments for `cat`
#[derive(Debug, Args)]
pub struct CatArgs {
    /// Logical file path
    pub path: String,
}

/// Arguments for `write`
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Logical file path
    pub path: String,
    /// New content; read from stdin when omitted
    #[arg(long)]
    pub content: Option<String>,
}

/// Arguments for `mkdir` and `touch`
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Logical path to create
    pub path: String,
    /// Succeed when the target already exists
    #[arg(long)]
    pub exist_ok: bool,
}

/// Arguments for `rm`
#[derive(Debug, Args)]
pub struct RmArgs {
    /// Logical path to delete
    pub path: String,
}

/// Arguments for `rename`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Logical path of the entry
    pub path: String,
    /// New name within the same directory
    pub new_name: String,
}

pub async fn ls(args: &LsArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let session = super::open_session(config_path).await?;
    let items = session.ready_provider().await?.list(&args.path).await?;
    output::print_listing(&items, format);
    Ok(())
}

pub async fn cat(args: &CatArgs, config_path: &str) -> Result<(), AppError> {
    let session = super::open_session(config_path).await?;
    let content = session.ready_provider().await?.read_file(&args.path).await?;
    print!("{content}");
    Ok(())
}

pub async fn write(args: &WriteArgs, config_path: &str) -> Result<(), AppError> {
    let content = match &args.content {
        Some(content) => content.clone(),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .map_err(|e| AppError::from_io(e, "Failed to read content from stdin"))?;
            buf
        }
    };

    let session = super::open_session(config_path).await?;
    session
        .ready_provider()
        .await?
        .write_file(&args.path, &content)
        .await?;
    output::print_success(&format!("Wrote {} bytes to {}", content.len(), args.path));
    Ok(())
}

pub async fn mkdir(args: &CreateArgs, config_path: &str) -> Result<(), AppError> {
    let session = super::open_session(config_path).await?;
    let result = session.ready_provider().await?.create_folder(&args.path).await;
    finish_create(result, args, "Created directory")
}

pub async fn touch(args: &CreateArgs, config_path: &str) -> Result<(), AppError> {
    let session = super::open_session(config_path).await?;
    let result = session.ready_provider().await?.create_file(&args.path).await;
    finish_create(result, args, "Created file")
}

fn finish_create(result: Result<(), AppError>, args: &CreateArgs, done: &str) -> Result<(), AppError> {
    match result {
        Ok(()) => {
            output::print_success(&format!("{done} {}", args.path));
            Ok(())
        }
        Err(e) if args.exist_ok && e.is(ErrorKind::AlreadyExists) => {
            output::print_warning(&format!("{} already exists", args.path));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub async fn rm(args: &RmArgs, config_path: &str) -> Result<(), AppError> {
    let session = super::open_session(config_path).await?;
    session.ready_provider().await?.delete(&args.path).await?;
    output::print_success(&format!("Deleted {}", args.path));
    Ok(())
}

pub async fn rename(args: &RenameArgs, config_path: &str) -> Result<(), AppError> {
    let session = super::open_session(config_path).await?;
    session
        .ready_provider()
        .await?
        .rename(&args.path, &args.new_name)
        .await?;
    output::print_success(&format!("Renamed {} to {}", args.path, args.new_name));
    Ok(())
}
