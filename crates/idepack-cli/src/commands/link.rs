//! Link / unlink commands for local development packages

use console::style;
use idepack_repo::RegistryResolver;
use std::path::Path;

use super::Context;
use crate::error::{CliError, Result};

pub fn link(ctx: &Context, dir: &Path) -> Result<()> {
    let mut resolver = RegistryResolver::load(&ctx.layout)?;
    let meta = resolver.link_pack(dir)?;

    println!(
        "{} {} v{} -> {}",
        style("Linked").green().bold(),
        meta.name,
        meta.version,
        meta.local_path
            .as_deref()
            .unwrap_or(dir)
            .display()
    );
    Ok(())
}

pub fn unlink(ctx: &Context, name: Option<&str>, all: bool) -> Result<()> {
    let mut resolver = RegistryResolver::load(&ctx.layout)?;

    if all {
        let count = resolver.unlink_all()?;
        println!("{} {} linked package(s)", style("Unlinked").green().bold(), count);
        return Ok(());
    }

    let name = name.ok_or_else(|| CliError::input("a package name or --all is required"))?;
    let meta = resolver.unlink_pack(name)?;
    println!("{} {}", style("Unlinked").green().bold(), meta.name);
    Ok(())
}
