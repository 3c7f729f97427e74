//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use termuxfm_core::traits::storage::FileItem;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One directory entry as a table row
#[derive(Debug, Serialize, Tabled)]
pub struct FileRow {
    /// Entry name, directories end in `/`
    name: String,
    /// Size in bytes
    size: String,
    /// Last modification time
    modified: String,
}

impl From<&FileItem> for FileRow {
    fn from(item: &FileItem) -> Self {
        Self {
            name: if item.is_directory {
                format!("{}/", item.name)
            } else {
                item.name.clone()
            },
            size: item.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            modified: item
                .last_modified
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Print a directory listing in the selected format
pub fn print_listing(items: &[FileItem], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<FileRow> = items.iter().map(FileRow::from).collect();
            print_list(&rows, format);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("(empty)");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{item:#?}");
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_row_marks_directories() {
        let dir = FileItem {
            name: "Scripts".to_string(),
            path: "/Scripts".to_string(),
            is_directory: true,
            size: None,
            last_modified: None,
        };
        let row = FileRow::from(&dir);
        assert_eq!(row.name, "Scripts/");
        assert_eq!(row.size, "-");

        let file = FileItem {
            name: "a.sh".to_string(),
            path: "/a.sh".to_string(),
            is_directory: false,
            size: Some(19),
            last_modified: None,
        };
        assert_eq!(FileRow::from(&file).size, "19");
    }
}
