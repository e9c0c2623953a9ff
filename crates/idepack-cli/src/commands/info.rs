//! Info command - package details and template variables

use console::style;
use idepack_core::{PackageMetadata, Placeholder, Values, placeholder};
use idepack_repo::{RegistryResolver, ResolvedPack};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

use super::Context;
use crate::error::Result;

pub fn run(ctx: &Context, name: &str) -> Result<()> {
    let resolver = RegistryResolver::load(&ctx.layout)?;
    let pack = resolver.resolve_pack(name)?;
    let meta = &pack.meta;

    println!(
        "{} {} v{}",
        style("Package").cyan().bold(),
        meta.name,
        meta.version
    );
    field("Type", &meta.kind.to_string());
    field("Source", &pack.source.to_string());
    field("Description", &meta.description);
    field("Author", &meta.author);
    field("Category", &meta.category);
    if let Some(repo) = &meta.repository {
        field("Repository", repo);
    }
    if !meta.dependencies.is_empty() {
        field("Dependencies", &meta.dependencies.join(", "));
    }
    if !meta.dist.tarball.is_empty() {
        field("Tarball", &meta.dist.tarball);
    }
    if pack.is_linked() {
        field("Linked", &pack.install_path.display().to_string());
    } else if pack.installed {
        field("Installed", &pack.install_path.display().to_string());
    }

    if !meta.config_schema.is_empty() {
        println!();
        println!("{}:", style("Configuration").bold());
        for (key, cfg) in &meta.config_schema {
            let mut line = format!("  {key}");
            if !cfg.field_type.is_empty() {
                line.push_str(&format!(" ({})", cfg.field_type));
            }
            if cfg.required {
                line.push_str(&format!(" {}", style("required").red()));
            }
            if let Some(default) = &cfg.default {
                line.push_str(&format!(" [default: {default}]"));
            }
            println!("{line}");
            if !cfg.description.is_empty() {
                println!("      {}", style(&cfg.description).dim());
            }
        }
    }

    if pack.installed || pack.is_linked() {
        print_template_variables(&pack)?;
    }
    Ok(())
}

fn field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<13} {}", style(label).dim(), value);
    }
}

/// Placeholders used by the installed templates, with their defaults
fn print_template_variables(pack: &ResolvedPack) -> Result<()> {
    let meta = PackageMetadata::load(&pack.install_path)?;
    let (placeholders, defaults) = template_variables(&template_sources(&meta, &pack.install_path));
    if placeholders.is_empty() {
        return Ok(());
    }

    println!();
    println!("{}:", style("Template variables").bold());
    for p in &placeholders {
        match &p.default {
            Some(default) => println!("  {} [default: {}]", p.path, default),
            None => println!("  {}", p.path),
        }
    }

    let tree = serde_json::to_string_pretty(defaults.inner()).unwrap_or_default();
    println!();
    println!("{}:", style("Example vars").bold());
    for line in tree.lines() {
        println!("  {line}");
    }
    Ok(())
}

/// Each text the sync engine substitutes on its own: rule files, the MCP
/// command, every argument and every env value
fn template_sources(meta: &PackageMetadata, root: &Path) -> Vec<String> {
    let mut sources = Vec::new();
    for rel in &meta.rules {
        let path = root.join(rel);
        match std::fs::read_to_string(&path) {
            Ok(content) => sources.push(content),
            Err(e) => warn!(path = %path.display(), error = %e, "cannot read rule template"),
        }
    }
    if let Some(mcp) = &meta.mcp {
        sources.push(mcp.command.clone());
        sources.extend(mcp.args.iter().cloned());
        sources.extend(mcp.env.values().cloned());
    }
    sources
}

/// Distinct placeholders across `sources` and a tree of their defaults
///
/// Sources are parsed separately so no token spans two of them.
fn template_variables(sources: &[String]) -> (Vec<Placeholder>, Values) {
    let mut seen = HashSet::new();
    let placeholders: Vec<Placeholder> = sources
        .iter()
        .flat_map(|source| placeholder::parse(source))
        .filter(|p| seen.insert(p.raw.clone()))
        .collect();
    let defaults = placeholder::default_vars(&placeholders);
    (placeholders, defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JsonValue;

    fn mcp_meta(command: &str, args: &[&str]) -> PackageMetadata {
        serde_json::from_value(serde_json::json!({
            "name": "db",
            "version": "1.0.0",
            "type": "mcp",
            "mcp": {"command": command, "args": args, "env": {"HOST": "{{host:-localhost}}"}}
        }))
        .unwrap()
    }

    #[test]
    fn test_mcp_parts_are_separate_sources() {
        let meta = mcp_meta("{{bin:-db-server}}", &["--port", "{{port:-", "5432}}"]);
        let sources = template_sources(&meta, Path::new("/nonexistent"));
        assert_eq!(sources.len(), 5);

        let (placeholders, defaults) = template_variables(&sources);
        let paths: Vec<_> = placeholders.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["bin", "host"]);
        assert_eq!(defaults.get("host"), Some(&JsonValue::String("localhost".into())));
    }

    #[test]
    fn test_first_default_wins() {
        let sources = vec!["{{a:-x}} {{b}}".to_string(), "{{a:-y}}".to_string()];
        let (placeholders, defaults) = template_variables(&sources);
        assert_eq!(placeholders.len(), 3);
        assert_eq!(defaults.get("a"), Some(&JsonValue::String("x".into())));
        assert_eq!(defaults.get("b"), Some(&JsonValue::String(String::new())));
    }
}
