//! List command

use console::style;
use idepack_repo::{Installer, RegistryResolver};

use super::Context;
use crate::error::Result;
use crate::util::truncate;

pub fn run(ctx: &Context, installed_only: bool) -> Result<()> {
    if installed_only {
        return list_installed(ctx);
    }

    let resolver = RegistryResolver::load(&ctx.layout)?;
    let packs = resolver.list_all_packs();
    if packs.is_empty() {
        println!("No packages available. Run `idepack update` to fetch the registry.");
        return Ok(());
    }

    println!(
        "{:<25} {:<10} {:<5} {:<9} {:<10} DESCRIPTION",
        "NAME", "VERSION", "TYPE", "SOURCE", "STATUS"
    );
    println!("{}", "-".repeat(90));

    for pack in packs {
        let status = if pack.is_linked() {
            style(format!("{:<10}", "linked")).cyan()
        } else if pack.installed {
            style(format!("{:<10}", "installed")).green()
        } else {
            style(format!("{:<10}", "-")).dim()
        };
        println!(
            "{:<25} {:<10} {:<5} {:<9} {} {}",
            pack.meta.name,
            pack.meta.version,
            pack.meta.kind,
            pack.source,
            status,
            truncate(&pack.meta.description, 40)
        );
    }
    Ok(())
}

fn list_installed(ctx: &Context) -> Result<()> {
    let installer = Installer::new(&ctx.layout, &ctx.settings)?;
    let installed = installer.list_installed()?;
    if installed.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }

    println!("{:<25} {:<10} {:<5} DESCRIPTION", "NAME", "VERSION", "TYPE");
    println!("{}", "-".repeat(70));
    for meta in installed {
        println!(
            "{:<25} {:<10} {:<5} {}",
            meta.name,
            meta.version,
            meta.kind,
            truncate(&meta.description, 40)
        );
    }
    Ok(())
}
