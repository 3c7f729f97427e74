//! Script template configuration.

use serde::{Deserialize, Serialize};

/// Settings for generated scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Directory holding the interpreters referenced by generated shebangs.
    #[serde(default = "default_interpreter_prefix")]
    pub interpreter_prefix: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            interpreter_prefix: default_interpreter_prefix(),
        }
    }
}

fn default_interpreter_prefix() -> String {
    "/data/data/com.termux/files/usr/bin".to_string()
}
