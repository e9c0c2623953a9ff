//! Sync command - regenerate IDE configuration for a project

use console::style;
use idepack_core::{ConfigItem, PathLayout, ProjectConfig};
use idepack_repo::{RegistryResolver, RepoError};
use idepack_sync::{EnabledPack, Ide, IdeAdapter, SyncEngine};
use std::path::{Path, PathBuf};

use super::Context;
use crate::error::{CliError, Result};

pub fn run(ctx: &Context, project: &Path) -> Result<()> {
    let config = ProjectConfig::load(project)?;
    let resolver = RegistryResolver::load(&ctx.layout)?;

    let mut missing = Vec::new();
    let mut rule_packs = Vec::new();
    for (_category, item) in config.rule_items() {
        if let Some(pack) = enabled_pack(&resolver, &ctx.layout, item, &mut missing)? {
            rule_packs.push(pack);
        }
    }
    let mut mcp_packs = Vec::new();
    for item in config.mcp_items() {
        if let Some(pack) = enabled_pack(&resolver, &ctx.layout, item, &mut missing)? {
            mcp_packs.push(pack);
        }
    }

    if !missing.is_empty() {
        return Err(CliError::validation_with_help(
            format!("packages not installed: {}", missing.join(", ")),
            format!("run `idepack install {}`", missing.join(" ")),
        ));
    }

    let ides = config
        .target_ides()
        .iter()
        .map(|name| Ide::from_name(name))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let adapters: Vec<&dyn IdeAdapter> = ides.iter().map(|ide| ide as &dyn IdeAdapter).collect();

    let engine = SyncEngine::new(&ctx.settings);
    let report = engine.sync(project, &adapters, &rule_packs, &mcp_packs)?;

    for ide in &report.ides {
        println!(
            "{} {}: {} rule file(s), {} MCP server(s)",
            style("Synced").green().bold(),
            ide.ide,
            ide.rules_written,
            ide.mcp_servers
        );
        println!("  {} {}", style("MCP config").dim(), ide.mcp_path.display());
    }
    Ok(())
}

/// Locate an enabled package on disk; linked checkouts win over installs
fn enabled_pack(
    resolver: &RegistryResolver,
    layout: &PathLayout,
    item: &ConfigItem,
    missing: &mut Vec<String>,
) -> Result<Option<EnabledPack>> {
    let root: Option<PathBuf> = match resolver.resolve_pack(&item.name) {
        Ok(pack) if pack.is_linked() || pack.installed => Some(pack.install_path),
        Ok(_) => None,
        Err(RepoError::PackNotFound { .. }) => {
            let dir = layout.install_dir(&item.name);
            dir.is_dir().then_some(dir)
        }
        Err(e) => return Err(e.into()),
    };

    match root {
        Some(root) => Ok(Some(EnabledPack::load(&root, &item.vars)?)),
        None => {
            missing.push(item.name.clone());
            Ok(None)
        }
    }
}
