//! Regenerates IDE rule files and MCP config from enabled packages

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use idepack_core::{PackageMetadata, Settings, Values, placeholder};
use tracing::{info, warn};

use crate::error::{Result, SyncError};
use crate::ide::IdeAdapter;
use crate::mcp::{McpConfig, McpServer, SELF_KEY, managed_key};
use crate::rules::{RuleFile, render_rules};

/// A package enabled in a project, located on disk
#[derive(Debug, Clone)]
pub struct EnabledPack {
    pub name: String,
    /// Installed (or linked) package directory
    pub root: PathBuf,
    pub meta: PackageMetadata,
    /// Effective variables: schema defaults under the project's overrides
    pub vars: Values,
}

impl EnabledPack {
    pub fn new(root: impl Into<PathBuf>, meta: PackageMetadata, overrides: &Values) -> Self {
        let vars = meta.effective_vars(overrides);
        for key in meta.missing_required(&vars) {
            warn!(pack = %meta.name, variable = %key, "required variable is not set");
        }
        Self {
            name: meta.name.clone(),
            root: root.into(),
            meta,
            vars,
        }
    }

    /// Read the package descriptor from `root`
    pub fn load(root: &Path, overrides: &Values) -> Result<Self> {
        let meta = PackageMetadata::load(root)?;
        Ok(Self::new(root, meta, overrides))
    }

    /// Server entry for this package, or `None` if it declares no MCP launch
    fn mcp_server(&self) -> Option<McpServer> {
        let launch = self.meta.mcp.as_ref()?;
        let subst = |s: &str| placeholder::replace(s, &self.vars);

        let command = subst(&launch.command);
        let in_pack = self.root.join(&command);
        let command = if Path::new(&command).is_relative() && in_pack.is_file() {
            in_pack.display().to_string()
        } else {
            command
        };

        Some(McpServer {
            command,
            args: launch.args.iter().map(|a| subst(a.as_str())).collect(),
            env: launch
                .env
                .iter()
                .map(|(k, v)| (k.clone(), subst(v.as_str())))
                .collect(),
        })
    }
}

/// Outcome of syncing one IDE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeSyncReport {
    pub ide: String,
    pub rules_removed: usize,
    pub rules_written: usize,
    pub mcp_path: PathBuf,
    pub mcp_servers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub ides: Vec<IdeSyncReport>,
}

pub struct SyncEngine {
    self_command: String,
}

impl SyncEngine {
    pub fn new(settings: &Settings) -> Self {
        Self {
            self_command: settings.self_command.clone(),
        }
    }

    /// Managed MCP entries: the self entry plus one per MCP package
    pub fn managed_servers(&self, mcp_packs: &[EnabledPack]) -> BTreeMap<String, McpServer> {
        let mut servers = BTreeMap::new();
        servers.insert(
            SELF_KEY.to_string(),
            McpServer {
                command: self.self_command.clone(),
                args: vec!["serve".to_string()],
                ..Default::default()
            },
        );
        for pack in mcp_packs {
            match pack.mcp_server() {
                Some(server) => {
                    servers.insert(managed_key(&pack.name), server);
                }
                None => warn!(pack = %pack.name, "package declares no MCP server; skipping"),
            }
        }
        servers
    }

    /// Regenerate managed rules and MCP entries for every IDE
    ///
    /// Templates are rendered and existing MCP configs are parsed before
    /// anything is removed, so a failing input leaves the project as it was.
    pub fn sync(
        &self,
        project_root: &Path,
        ides: &[&dyn IdeAdapter],
        rule_packs: &[EnabledPack],
        mcp_packs: &[EnabledPack],
    ) -> Result<SyncReport> {
        let mut rules: Vec<RuleFile> = Vec::new();
        let mut owners: BTreeMap<String, &str> = BTreeMap::new();
        for pack in rule_packs {
            for rule in render_rules(&pack.name, &pack.root, &pack.meta.rules, &pack.vars)? {
                if let Some(first) = owners.insert(rule.name.clone(), &pack.name) {
                    return Err(SyncError::DuplicateRuleFile {
                        name: rule.name,
                        first: first.to_string(),
                        second: pack.name.clone(),
                    });
                }
                rules.push(rule);
            }
        }
        let managed = self.managed_servers(mcp_packs);

        let merged = ides
            .iter()
            .map(|ide| McpConfig::merge(&ide.load_mcp_config(project_root)?, &managed))
            .collect::<Result<Vec<_>>>()?;

        let mut report = SyncReport::default();
        for (ide, merged) in ides.iter().zip(merged) {
            let rules_removed = ide.clean_managed_rules(project_root)?;
            ide.write_rules(project_root, &rules)?;

            ide.write_mcp_config(project_root, &merged)?;

            info!(
                ide = ide.name(),
                rules = rules.len(),
                servers = merged.servers.len(),
                "synced"
            );
            report.ides.push(IdeSyncReport {
                ide: ide.name().to_string(),
                rules_removed,
                rules_written: rules.len(),
                mcp_path: ide.mcp_config_path(project_root),
                mcp_servers: merged.servers.len(),
            });
        }
        Ok(report)
    }
}
