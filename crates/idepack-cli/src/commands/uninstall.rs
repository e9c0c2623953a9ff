//! Uninstall command

use console::style;
use idepack_repo::Installer;

use super::Context;
use crate::error::Result;

pub fn run(ctx: &Context, names: &[String]) -> Result<()> {
    let installer = Installer::new(&ctx.layout, &ctx.settings)?;

    for name in names {
        if installer.uninstall(name)? {
            println!("{} {}", style("Removed").green().bold(), name);
        } else {
            println!("{} {} is not installed", style("Skipped").yellow().bold(), name);
        }
    }
    Ok(())
}
