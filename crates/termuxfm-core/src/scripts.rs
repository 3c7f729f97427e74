//! Script detection and templates.

use serde::{Deserialize, Serialize};

/// Interpreted languages the workspace recognizes by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    Bash,
    Python,
    Node,
    Php,
    Ruby,
    Perl,
    Lua,
}

impl ScriptKind {
    /// Detect the script kind of a path from its extension, case-insensitively.
    pub fn detect(path: &str) -> Option<Self> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "sh" | "bash" => Some(Self::Bash),
            "py" => Some(Self::Python),
            "js" => Some(Self::Node),
            "php" => Some(Self::Php),
            "rb" => Some(Self::Ruby),
            "pl" => Some(Self::Perl),
            "lua" => Some(Self::Lua),
            _ => None,
        }
    }

    /// Interpreter binary name.
    pub fn interpreter(&self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Python => "python",
            Self::Node => "node",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Perl => "perl",
            Self::Lua => "lua",
        }
    }

    /// Extension appended to new scripts that have none.
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Bash => "sh",
            Self::Python => "py",
            Self::Node => "js",
            Self::Php => "php",
            Self::Ruby => "rb",
            Self::Perl => "pl",
            Self::Lua => "lua",
        }
    }

    /// Shebang line for this kind under the given interpreter directory.
    pub fn shebang(&self, interpreter_prefix: &str) -> String {
        format!(
            "#!{}/{}",
            interpreter_prefix.trim_end_matches('/'),
            self.interpreter()
        )
    }

    fn comment_prefix(&self) -> &'static str {
        match self {
            Self::Node | Self::Php => "//",
            Self::Lua => "--",
            _ => "#",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Python => "Python",
            Self::Node => "Node.js",
            Self::Php => "PHP",
            Self::Ruby => "Ruby",
            Self::Perl => "Perl",
            Self::Lua => "Lua",
        }
    }
}

/// Whether a path looks like a script.
pub fn is_script(path: &str) -> bool {
    ScriptKind::detect(path).is_some()
}

/// Build a new script from a raw user-supplied name.
///
/// Returns `(file_name, body)`. A name without a recognized extension
/// becomes a bash script; `.sh` is only appended when the name has no
/// extension at all.
pub fn script_template(raw_name: &str, interpreter_prefix: &str) -> (String, String) {
    let (kind, file_name) = match ScriptKind::detect(raw_name) {
        Some(kind) => (kind, raw_name.to_string()),
        None if raw_name.contains('.') => (ScriptKind::Bash, raw_name.to_string()),
        None => (
            ScriptKind::Bash,
            format!("{raw_name}.{}", ScriptKind::Bash.default_extension()),
        ),
    };

    let comment = kind.comment_prefix();
    let mut body = String::new();
    body.push_str(&kind.shebang(interpreter_prefix));
    body.push_str("\n\n");
    body.push_str(&format!(
        "{comment} New {} script generated by Termux File Manager\n",
        kind.display_name()
    ));
    match kind {
        ScriptKind::Python => body.push_str(&format!(
            "\nif __name__ == \"__main__\":\n    print(\"Hello from {file_name}\")\n"
        )),
        ScriptKind::Node => body.push_str(&format!("\nconsole.log(\"Hello from {file_name}\");\n")),
        _ => body.push_str(&format!("\n{comment} Your code here\n")),
    }

    (file_name, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/data/data/com.termux/files/usr/bin";

    #[test]
    fn test_detect() {
        assert_eq!(ScriptKind::detect("/a/run.SH"), Some(ScriptKind::Bash));
        assert_eq!(ScriptKind::detect("tool.bash"), Some(ScriptKind::Bash));
        assert_eq!(ScriptKind::detect("main.py"), Some(ScriptKind::Python));
        assert_eq!(ScriptKind::detect("/x.y/notes"), None);
        assert_eq!(ScriptKind::detect("README.md"), None);
        assert!(is_script("/Scripts/a.lua"));
    }

    #[test]
    fn test_template_adds_extension() {
        let (name, body) = script_template("backup", PREFIX);
        assert_eq!(name, "backup.sh");
        assert!(body.starts_with("#!/data/data/com.termux/files/usr/bin/bash\n\n"));
        assert!(body.ends_with("# Your code here\n"));
    }

    #[test]
    fn test_template_keeps_known_and_unknown_extensions() {
        let (name, body) = script_template("hello.py", PREFIX);
        assert_eq!(name, "hello.py");
        assert!(body.contains("print(\"Hello from hello.py\")"));

        let (name, body) = script_template("notes.txt", "/usr/bin/");
        assert_eq!(name, "notes.txt");
        assert!(body.starts_with("#!/usr/bin/bash"));
    }

    #[test]
    fn test_node_template_uses_slash_comments() {
        let (_, body) = script_template("app.js", PREFIX);
        assert!(body.contains("// New Node.js script"));
        assert!(body.contains("console.log(\"Hello from app.js\");"));
    }
}
