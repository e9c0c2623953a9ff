//! Package descriptor (`package.json`) and registry entry model

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, IoContext, Result};
use crate::platform::ExecutableSpec;
use crate::values::Values;

/// File name of the self-descriptor at every package root
pub const DESCRIPTOR_FILE: &str = "package.json";

/// Package type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    #[default]
    Rule,
    Mcp,
}

impl std::fmt::Display for PackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackKind::Rule => f.pad("rule"),
            PackKind::Mcp => f.pad("mcp"),
        }
    }
}

/// Download and integrity information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dist {
    /// File name relative to the download base, or an absolute URL
    #[serde(default)]
    pub tarball: String,

    /// Hex SHA256 of the tarball, optionally prefixed with `sha256:`
    #[serde(default)]
    pub sha256: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub size: u64,
}

/// How an MCP package launches its server
///
/// Every string may contain placeholders that are resolved at sync time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpLaunch {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// One user-configurable variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigField {
    #[serde(rename = "type", default)]
    pub field_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

/// Package metadata
///
/// The same shape is used for the descriptor shipped inside a package and
/// for entries of the keyed registry documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(rename = "type", default)]
    pub kind: PackKind,

    #[serde(rename = "displayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,

    /// Git repository URL; accepts a bare string or `{ "url": ... }`
    #[serde(
        default,
        deserialize_with = "deserialize_repository",
        skip_serializing_if = "Option::is_none"
    )]
    pub repository: Option<String>,

    /// Rule files, relative to the package root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<McpLaunch>,

    /// Executable exposed in the shared bin directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<ExecutableSpec>,

    /// Other packages installed before this one
    #[serde(default, alias = "requires", skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config_schema: BTreeMap<String, ConfigField>,

    #[serde(default)]
    pub dist: Dist,

    /// Development checkout this entry points to (local registry only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,

    /// RFC 3339 time the entry was linked (local registry only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_at: Option<String>,
}

impl PackageMetadata {
    /// Load the descriptor from a package directory
    pub fn load(pack_dir: &Path) -> Result<Self> {
        let path = pack_dir.join(DESCRIPTOR_FILE);
        let content = std::fs::read_to_string(&path).io_context("read", &path)?;
        let meta: Self =
            serde_json::from_str(&content).map_err(|e| CoreError::InvalidDescriptor {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        meta.validate()
            .map_err(|message| CoreError::InvalidDescriptor {
                path: path.display().to_string(),
                message,
            })?;
        Ok(meta)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        self.validate_identity().map_err(|e| e.to_string())
    }

    /// Name and version are used as path components under the idepack root
    pub fn validate_identity(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_version(&self.version)
    }

    /// Parsed semver version, if the entry declares one
    pub fn semver(&self) -> Result<Option<semver::Version>> {
        if self.version.is_empty() {
            return Ok(None);
        }
        Ok(Some(semver::Version::parse(&self.version)?))
    }

    /// Nested tree of the defaults declared in `config_schema`
    ///
    /// Keys may be dotted (`db.host`), producing nested objects.
    pub fn schema_defaults(&self) -> Values {
        let mut values = Values::new();
        for (key, field) in &self.config_schema {
            if let Some(default) = &field.default {
                values.set(key, default.clone());
            }
        }
        values
    }

    /// Variables used for template substitution: schema defaults under user overrides
    pub fn effective_vars(&self, overrides: &Values) -> Values {
        Values::with_schema_defaults(self.schema_defaults(), overrides)
    }

    /// Required schema fields that are unset in `vars`
    pub fn missing_required(&self, vars: &Values) -> Vec<String> {
        self.config_schema
            .iter()
            .filter(|(key, field)| field.required && vars.get(key).is_none())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Default archive name for this package
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tar.gz", self.name, self.version)
    }
}

/// A package name must be usable as one directory name
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        "name is required"
    } else if name.contains(['/', '\\']) {
        "must not contain path separators"
    } else if name.starts_with('.') {
        "must not start with '.'"
    } else {
        return Ok(());
    };
    Err(CoreError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// An empty version is allowed; anything else must be semver
pub fn validate_version(version: &str) -> Result<()> {
    if !version.is_empty() {
        semver::Version::parse(version)?;
    }
    Ok(())
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

fn deserialize_repository<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repo {
        Url(String),
        Object {
            url: String,
        },
    }

    Ok(match Option::<Repo>::deserialize(deserializer)? {
        Some(Repo::Url(url)) | Some(Repo::Object { url }) if !url.is_empty() => Some(url),
        _ => None,
    })
}
