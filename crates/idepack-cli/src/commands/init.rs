//! Init command - scaffold `.idepack/project.yaml`

use console::style;
use idepack_core::ProjectConfig;
use idepack_sync::{Ide, IdeAdapter};
use std::path::Path;

use crate::error::{CliError, Result};

pub fn run(project: &Path, ides: &[String], force: bool) -> Result<()> {
    let path = ProjectConfig::path(project);
    if path.exists() && !force {
        return Err(CliError::validation_with_help(
            format!("{} already exists", path.display()),
            "pass --force to overwrite it",
        ));
    }

    let ides = ides
        .iter()
        .map(|name| Ide::from_name(name).map(|ide| ide.name().to_string()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let name = project
        .canonicalize()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()));

    let config = ProjectConfig {
        name,
        ides,
        ..ProjectConfig::default()
    };
    config.save(project)?;

    println!("{} {}", style("Created").green().bold(), path.display());
    println!(
        "  {} list packages under languages, frameworks, platforms, patterns or mcps, then run `idepack sync`",
        style("Next:").dim()
    );
    Ok(())
}
