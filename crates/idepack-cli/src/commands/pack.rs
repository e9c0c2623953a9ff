//! Pack command - build a distributable archive

use console::style;
use idepack_core::create_archive;
use std::path::Path;

use crate::error::Result;
use crate::util::format_size;

pub fn run(dir: &Path, output: Option<&Path>) -> Result<()> {
    let info = create_archive(dir, output.unwrap_or(dir))?;

    println!("{} {}", style("Created").green().bold(), info.path.display());
    println!("  {} {}", style("Size").dim(), format_size(info.size));
    println!("  {} {}", style("SHA256").dim(), info.sha256);
    Ok(())
}
