//! Registry documents and their trust tiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use idepack_core::{IoContext, PackageMetadata, PathLayout, validate_name};

use crate::error::{RepoError, Result};

/// Where a registry document comes from, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryTier {
    /// Development links created by `idepack link`
    Local,
    Test,
    Official,
}

impl RegistryTier {
    /// Highest priority first
    pub const PRIORITY: [RegistryTier; 3] =
        [RegistryTier::Local, RegistryTier::Test, RegistryTier::Official];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryTier::Local => "local",
            RegistryTier::Test => "test",
            RegistryTier::Official => "official",
        }
    }

    pub fn file(&self, layout: &PathLayout) -> std::path::PathBuf {
        layout.registry_file(self.as_str())
    }
}

impl std::fmt::Display for RegistryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A registry document, keyed by package name
///
/// Reads both the keyed form (`packs: {name: {...}}`) and the flat form
/// published upstream (`packages: [{...}]`); always writes the keyed form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRegistry")]
pub struct Registry {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    pub packs: BTreeMap<String, PackageMetadata>,
}

#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default)]
    version: serde_json::Value,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    packs: BTreeMap<String, PackageMetadata>,
    #[serde(default)]
    packages: Vec<PackageMetadata>,
}

impl TryFrom<RawRegistry> for Registry {
    type Error = String;

    /// Every entry's name and version end up in install and cache paths,
    /// so a document with an unsafe entry is rejected as a whole
    fn try_from(raw: RawRegistry) -> std::result::Result<Self, Self::Error> {
        let version = match raw.version {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };

        let mut packs = BTreeMap::new();
        for (key, mut meta) in raw.packs {
            if meta.name.is_empty() {
                meta.name = key.clone();
            }
            validate_name(&key).map_err(|e| e.to_string())?;
            meta.validate_identity().map_err(|e| format!("entry '{key}': {e}"))?;
            packs.insert(key, meta);
        }
        for meta in raw.packages {
            if meta.name.is_empty() {
                continue;
            }
            meta.validate_identity().map_err(|e| format!("entry '{}': {e}", meta.name))?;
            if packs.contains_key(&meta.name) {
                tracing::warn!(name = %meta.name, "duplicate registry entry ignored");
                continue;
            }
            packs.insert(meta.name.clone(), meta);
        }

        Ok(Self {
            version,
            updated_at: raw.updated_at,
            packs,
        })
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            version: "1".to_string(),
            updated_at: None,
            packs: BTreeMap::new(),
        }
    }

    pub fn from_slice(data: &[u8], source: &str) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| RepoError::InvalidRegistry {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a registry file; a missing or empty file is an empty registry
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "registry file absent, treating as empty");
                return Ok(Self::new());
            }
            other => other.io_context("read", path)?,
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }
        Self::from_slice(&data, &path.display().to_string())
    }

    /// Write the keyed form as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).io_context("create directory", parent)?;
        }
        let mut content = serde_json::to_string_pretty(self).map_err(|e| {
            RepoError::InvalidRegistry {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;
        content.push('\n');
        std::fs::write(path, content).io_context("write", path)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PackageMetadata> {
        self.packs.get(name)
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}
