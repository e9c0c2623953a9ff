//! User settings (`<root>/config.yaml`)
//!
//! Loaded once at startup and passed by reference to every component.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{IoContext, Result};
use crate::layout::PathLayout;

pub const DEFAULT_REGISTRY_URL: &str =
    "https://github.com/idepack/idepack/releases/download/registry/registry.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Official registry document
    pub registry_url: String,

    /// Base URL for relative tarball names (defaults to the registry's parent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_base_url: Option<String>,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    pub user_agent: String,

    /// Command written into the self MCP entry of every synced IDE
    pub self_command: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            download_base_url: None,
            timeout_secs: 60,
            user_agent: format!("idepack/{}", env!("CARGO_PKG_VERSION")),
            self_command: "idepack".to_string(),
        }
    }
}

impl Settings {
    /// Load from the layout's config file; a missing file yields defaults
    pub fn load(layout: &PathLayout) -> Result<Self> {
        Self::load_from(&layout.config_file())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).io_context("read", path),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).io_context("create directory", parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).io_context("write", path)
    }
}
