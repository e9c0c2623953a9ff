//! Install command

use console::style;
use idepack_repo::{Installer, RegistryResolver};

use super::Context;
use crate::error::Result;

pub async fn run(ctx: &Context, names: &[String], force: bool) -> Result<()> {
    let resolver = RegistryResolver::load(&ctx.layout)?;
    let installer = Installer::new(&ctx.layout, &ctx.settings)?;

    let report = installer.install_many(&resolver, names, force).await;

    for pack in &report.installed {
        println!(
            "{} {} v{}",
            style("Installed").green().bold(),
            pack.name,
            pack.version
        );
        if let Some(link) = &pack.bin_link {
            println!("  {} {}", style("Executable").dim(), link.display());
        }
    }
    for (name, reason) in &report.skipped {
        println!("{} {} ({})", style("Skipped").yellow().bold(), name, reason);
    }
    for (name, err) in &report.failed {
        eprintln!("{} {}: {}", style("Failed").red().bold(), name, err);
        if let Some(hint) = err.hint() {
            eprintln!("  {} {}", style("help:").cyan(), hint);
        }
    }

    report.into_result()?;
    Ok(())
}
