//! Per-IDE directory and file conventions

use std::path::{Path, PathBuf};

use idepack_core::IoContext;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::mcp::{MANAGED_PREFIX, McpConfig};
use crate::rules::RuleFile;

/// Where an IDE keeps its rules and MCP config inside a project
///
/// Implementors only describe locations; reading and writing are shared.
pub trait IdeAdapter {
    fn name(&self) -> &str;

    /// Directory that holds generated rule files
    fn rules_dir(&self, project_root: &Path) -> PathBuf;

    fn mcp_config_path(&self, project_root: &Path) -> PathBuf;

    fn write_rules(&self, project_root: &Path, files: &[RuleFile]) -> Result<()> {
        let dir = self.rules_dir(project_root);
        std::fs::create_dir_all(&dir).io_context("create rules directory", &dir)?;
        for file in files {
            let path = dir.join(&file.name);
            std::fs::write(&path, &file.content).io_context("write rule", &path)?;
        }
        Ok(())
    }

    fn load_mcp_config(&self, project_root: &Path) -> Result<McpConfig> {
        McpConfig::load(&self.mcp_config_path(project_root))
    }

    fn write_mcp_config(&self, project_root: &Path, config: &McpConfig) -> Result<()> {
        let path = self.mcp_config_path(project_root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).io_context("create directory", parent)?;
        }
        std::fs::write(&path, config.to_json()?).io_context("write MCP config", &path)?;
        Ok(())
    }

    /// Remove every generated rule file; returns how many were removed
    fn clean_managed_rules(&self, project_root: &Path) -> Result<usize> {
        let dir = self.rules_dir(project_root);
        let entries = match std::fs::read_dir(&dir) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            other => other.io_context("read rules directory", &dir)?,
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.io_context("read rules directory", &dir)?;
            let managed = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(MANAGED_PREFIX));
            if !managed || !entry.path().is_file() {
                continue;
            }
            let path = entry.path();
            std::fs::remove_file(&path).io_context("remove rule", &path)?;
            removed += 1;
        }
        debug!(ide = self.name(), removed, "cleaned managed rules");
        Ok(removed)
    }
}

/// Known IDEs plus a generic `.<name>` convention for everything else
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ide {
    Cursor,
    CodeBuddy,
    Windsurf,
    Trae,
    Other(String),
}

impl Ide {
    /// Unknown names map to `.<name>/` in the project, so they must be a
    /// single plain path component
    pub fn from_name(name: &str) -> Result<Self> {
        let ide = match name.trim().to_ascii_lowercase().as_str() {
            "cursor" => Ide::Cursor,
            "codebuddy" => Ide::CodeBuddy,
            "windsurf" => Ide::Windsurf,
            "trae" => Ide::Trae,
            other => {
                let plain = !other.is_empty()
                    && other
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
                if !plain {
                    return Err(SyncError::InvalidIdeName {
                        name: name.to_string(),
                    });
                }
                Ide::Other(other.to_string())
            }
        };
        Ok(ide)
    }

    fn dot_dir(&self) -> String {
        format!(".{}", self.name())
    }

    /// MCP config location that differs from `<dot dir>/mcp.json`
    fn mcp_override(&self) -> Option<&'static str> {
        match self {
            Ide::CodeBuddy => Some(".mcp.json"),
            _ => None,
        }
    }
}

impl IdeAdapter for Ide {
    fn name(&self) -> &str {
        match self {
            Ide::Cursor => "cursor",
            Ide::CodeBuddy => "codebuddy",
            Ide::Windsurf => "windsurf",
            Ide::Trae => "trae",
            Ide::Other(name) => name,
        }
    }

    fn rules_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(self.dot_dir()).join("rules")
    }

    fn mcp_config_path(&self, project_root: &Path) -> PathBuf {
        match self.mcp_override() {
            Some(file) => project_root.join(file),
            None => project_root.join(self.dot_dir()).join("mcp.json"),
        }
    }
}

impl std::fmt::Display for Ide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
