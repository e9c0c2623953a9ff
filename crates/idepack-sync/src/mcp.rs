//! MCP server config model and the managed/user merge
//!
//! Entries generated by idepack are identified by their key: the fixed
//! self entry [`SELF_KEY`] and `idepack-<package>` for package servers.
//! Every other key belongs to the user and survives regeneration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::path::Path;

use idepack_core::{CoreError, IoContext};

use crate::error::{Result, SyncError};

/// Key of the entry that launches idepack's own MCP server
pub const SELF_KEY: &str = "idepack";

/// Prefix marking generated entries and rule files
pub const MANAGED_PREFIX: &str = "idepack-";

/// Config key for a package's server entry
pub fn managed_key(package: &str) -> String {
    format!("{MANAGED_PREFIX}{package}")
}

pub fn is_managed_key(key: &str) -> bool {
    key == SELF_KEY || key.starts_with(MANAGED_PREFIX)
}

/// A generated `mcpServers` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl McpServer {
    pub fn to_value(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self).map_err(CoreError::from)?)
    }
}

/// An IDE's MCP config file
///
/// Server entries stay raw JSON: user entries are written back exactly as
/// they were read, whatever shape the IDE gives them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers", default)]
    pub servers: BTreeMap<String, JsonValue>,

    /// Other top-level keys of the file
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl McpConfig {
    /// Read a config file; absent or blank files are empty configs
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            other => other.io_context("read", path)?,
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).map_err(|e| SyncError::InvalidMcpConfig {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Pretty JSON with a trailing newline; key order is sorted
    pub fn to_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self).map_err(CoreError::from)?;
        out.push('\n');
        Ok(out)
    }

    /// Generated entries plus every user entry of `existing`
    ///
    /// Managed keys in `existing` are dropped, so servers of packages that
    /// are no longer enabled disappear. Top-level keys other than
    /// `mcpServers` are carried over from `existing`.
    pub fn merge(
        existing: &McpConfig,
        managed: &BTreeMap<String, McpServer>,
    ) -> Result<McpConfig> {
        let mut servers = managed
            .iter()
            .map(|(key, server)| Ok((key.clone(), server.to_value()?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        for (key, entry) in &existing.servers {
            if is_managed_key(key) {
                continue;
            }
            servers.entry(key.clone()).or_insert_with(|| entry.clone());
        }
        Ok(McpConfig {
            servers,
            extra: existing.extra.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn server(command: &str) -> McpServer {
        McpServer {
            command: command.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_keeps_user_and_drops_stale_managed() {
        let existing: McpConfig = serde_json::from_str(
            r#"{
                "mcpServers": {
                    "idepack": {"command": "old", "args": ["serve"]},
                    "idepack-removed": {"command": "gone"},
                    "my-tool": {"command": "mine", "disabled": true}
                },
                "theme": "dark"
            }"#,
        )
        .unwrap();

        let managed = BTreeMap::from([
            (SELF_KEY.to_string(), server("idepack")),
            (managed_key("db"), server("/opt/db")),
        ]);

        let merged = McpConfig::merge(&existing, &managed).unwrap();
        let keys: Vec<_> = merged.servers.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["idepack", "idepack-db", "my-tool"]);
        assert_eq!(merged.servers["idepack"]["command"], "idepack");
        assert_eq!(merged.servers["my-tool"]["disabled"], true);
        assert_eq!(merged.extra["theme"], "dark");
    }

    #[test]
    fn test_user_entries_round_trip() {
        let text = r#"{"mcpServers": {"remote": {"url": "https://mcp.example.com", "headers": {"x": "y"}}}}"#;
        let config: McpConfig = serde_json::from_str(text).unwrap();
        let back: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        let orig: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(back, orig);
    }

    #[test]
    fn test_user_entries_survive_merge_verbatim() {
        let user = serde_json::json!({
            "plain": {"command": "x", "args": [], "env": {}},
            "typed": {"command": "srv", "env": {"PORT": 8080, "DEBUG": true}},
            "odd": {"command": ["not", "a", "string"]}
        });
        let existing: McpConfig =
            serde_json::from_value(serde_json::json!({"mcpServers": user.clone()})).unwrap();

        let managed = BTreeMap::from([(SELF_KEY.to_string(), server("idepack"))]);
        let merged = McpConfig::merge(&existing, &managed).unwrap();
        let written: serde_json::Value = serde_json::from_str(&merged.to_json().unwrap()).unwrap();
        for key in ["plain", "typed", "odd"] {
            assert_eq!(written["mcpServers"][key], user[key]);
        }
        assert_eq!(written["mcpServers"]["idepack"], serde_json::json!({"command": "idepack"}));
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcp.json");
        assert_eq!(McpConfig::load(&path).unwrap(), McpConfig::default());

        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            McpConfig::load(&path).unwrap_err(),
            SyncError::InvalidMcpConfig { .. }
        ));
    }

    #[test]
    fn test_is_managed_key() {
        assert!(is_managed_key("idepack"));
        assert!(is_managed_key("idepack-db"));
        assert!(!is_managed_key("idepackage"));
        assert!(!is_managed_key("github"));
    }
}
