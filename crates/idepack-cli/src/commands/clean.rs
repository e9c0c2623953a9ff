//! Clean command - drop cached archives

use console::style;
use idepack_repo::Installer;

use super::Context;
use crate::error::Result;

pub fn run(ctx: &Context) -> Result<()> {
    let installer = Installer::new(&ctx.layout, &ctx.settings)?;
    let removed = installer.downloader().clean()?;
    println!("{} {} cached archive(s)", style("Removed").green().bold(), removed);
    Ok(())
}
