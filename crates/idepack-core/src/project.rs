//! Per-project configuration (`<project>/.idepack/project.yaml`)
//!
//! ```yaml
//! ides: [cursor, codebuddy]
//! languages:
//!   - dart
//!   - go: { module: github.com/acme/app }
//! frameworks: [flutter]
//! mcps:
//!   - github: { token: "..." }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, IoContext, Result};
use crate::values::Values;

pub const PROJECT_DIR: &str = ".idepack";
pub const PROJECT_FILE: &str = "project.yaml";

/// IDE synced when the project lists none
pub const DEFAULT_IDE: &str = "cursor";

/// An enabled package, written either as a bare name or `name: {vars}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItem", into = "RawItem")]
pub struct ConfigItem {
    pub name: String,
    pub vars: Values,
}

impl ConfigItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Values::new(),
        }
    }

    pub fn with_vars(name: impl Into<String>, vars: Values) -> Self {
        Self {
            name: name.into(),
            vars,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawItem {
    Name(String),
    Map(BTreeMap<String, JsonValue>),
}

impl TryFrom<RawItem> for ConfigItem {
    type Error = String;

    fn try_from(raw: RawItem) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawItem::Name(name) => Ok(ConfigItem::new(name)),
            RawItem::Map(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "expected a single `name: {{vars}}` entry, found {} keys",
                        map.len()
                    ));
                }
                let Some((name, vars)) = map.into_iter().next() else {
                    return Err("empty item".to_string());
                };
                match vars {
                    JsonValue::Null => Ok(ConfigItem::new(name)),
                    JsonValue::Object(_) => Ok(ConfigItem::with_vars(name, Values(vars))),
                    _ => Err(format!("variables of '{name}' must be a mapping")),
                }
            }
        }
    }
}

impl From<ConfigItem> for RawItem {
    fn from(item: ConfigItem) -> Self {
        if item.vars.is_empty() {
            RawItem::Name(item.name)
        } else {
            RawItem::Map(BTreeMap::from([(item.name, item.vars.into_inner())]))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ides: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<ConfigItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<ConfigItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<ConfigItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<ConfigItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcps: Vec<ConfigItem>,

    /// Additional rule categories beyond the four built-in ones
    #[serde(flatten)]
    pub extra_categories: BTreeMap<String, Vec<ConfigItem>>,
}

impl ProjectConfig {
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(PROJECT_DIR).join(PROJECT_FILE)
    }

    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::path(project_dir);
        let content = std::fs::read_to_string(&path).io_context("read", &path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| CoreError::InvalidProject {
            message: e.to_string(),
        })
    }

    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let path = Self::path(project_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).io_context("create directory", parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).io_context("write", &path)
    }

    /// IDEs to sync, falling back to the default IDE
    pub fn target_ides(&self) -> Vec<String> {
        if self.ides.is_empty() {
            vec![DEFAULT_IDE.to_string()]
        } else {
            self.ides.clone()
        }
    }

    /// Enabled rule packages as `(category, item)`, built-in categories first
    pub fn rule_items(&self) -> Vec<(&str, &ConfigItem)> {
        let builtin = [
            ("languages", &self.languages),
            ("frameworks", &self.frameworks),
            ("platforms", &self.platforms),
            ("patterns", &self.patterns),
        ];

        builtin
            .into_iter()
            .chain(
                self.extra_categories
                    .iter()
                    .map(|(category, items)| (category.as_str(), items)),
            )
            .flat_map(|(category, items)| items.iter().map(move |item| (category, item)))
            .collect()
    }

    pub fn mcp_items(&self) -> &[ConfigItem] {
        &self.mcps
    }
}
