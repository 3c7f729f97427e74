//! Permission repair configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Permission repair settings as written in the configuration file.
///
/// Modes are octal strings (`"664"`) so the file reads like a `chmod`
/// invocation; [`RepairConfig::policy`] parses them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Whether the privileged repair path may be used at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Superuser binary invoked as `<su_binary> -c "<command>"`.
    #[serde(default = "default_su_binary")]
    pub su_binary: String,
    /// Mode applied to regular files.
    #[serde(default = "default_file_mode")]
    pub file_mode: String,
    /// Mode applied to directories.
    #[serde(default = "default_directory_mode")]
    pub directory_mode: String,
    /// Mode applied by the script permission sweep when a plain chmod fails.
    #[serde(default = "default_script_mode")]
    pub script_mode: String,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            su_binary: default_su_binary(),
            file_mode: default_file_mode(),
            directory_mode: default_directory_mode(),
            script_mode: default_script_mode(),
        }
    }
}

/// Parsed repair policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairPolicy {
    /// Whether repairs are attempted.
    pub enabled: bool,
    /// Mode for regular files.
    pub file_mode: u32,
    /// Mode for directories.
    pub directory_mode: u32,
    /// Mode for scripts.
    pub script_mode: u32,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            file_mode: 0o664,
            directory_mode: 0o775,
            script_mode: 0o755,
        }
    }
}

impl RepairPolicy {
    /// A policy that never repairs.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Mode to apply for a file or directory target.
    pub fn mode_for(&self, is_directory: bool) -> u32 {
        if is_directory {
            self.directory_mode
        } else {
            self.file_mode
        }
    }
}

impl RepairConfig {
    /// Parse the configured modes into a [`RepairPolicy`].
    pub fn policy(&self) -> AppResult<RepairPolicy> {
        Ok(RepairPolicy {
            enabled: self.enabled,
            file_mode: parse_mode("repair.file_mode", &self.file_mode)?,
            directory_mode: parse_mode("repair.directory_mode", &self.directory_mode)?,
            script_mode: parse_mode("repair.script_mode", &self.script_mode)?,
        })
    }
}

/// Parse an octal permission string such as `"775"` or `"0644"`.
pub fn parse_mode(field: &str, raw: &str) -> AppResult<u32> {
    let digits = raw.trim();
    let mode = u32::from_str_radix(digits, 8).map_err(|e| {
        AppError::with_source(
            crate::error::ErrorKind::Configuration,
            format!("{field} must be an octal mode, got '{raw}'"),
            e,
        )
    })?;
    if digits.is_empty() || mode > 0o7777 {
        return Err(AppError::configuration(format!(
            "{field} is out of range: '{raw}'"
        )));
    }
    Ok(mode)
}

fn default_true() -> bool {
    true
}

fn default_su_binary() -> String {
    "su".to_string()
}

fn default_file_mode() -> String {
    "664".to_string()
}

fn default_directory_mode() -> String {
    "775".to_string()
}

fn default_script_mode() -> String {
    "755".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_config_defaults() {
        let policy = RepairConfig::default().policy().unwrap();
        assert_eq!(policy, RepairPolicy::default());
        assert_eq!(policy.mode_for(false), 0o664);
        assert_eq!(policy.mode_for(true), 0o775);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("m", "0644").unwrap(), 0o644);
        assert_eq!(parse_mode("m", " 755 ").unwrap(), 0o755);
        assert!(parse_mode("m", "888").is_err());
        assert!(parse_mode("m", "").is_err());
        assert!(parse_mode("m", "17777").is_err());
    }
}
