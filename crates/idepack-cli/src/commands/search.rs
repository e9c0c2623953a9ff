//! Search command

use console::style;
use idepack_repo::RegistryResolver;

use super::Context;
use crate::error::Result;
use crate::util::truncate;

pub fn run(ctx: &Context, query: &str) -> Result<()> {
    let resolver = RegistryResolver::load(&ctx.layout)?;
    let results = resolver.search(query);

    if results.is_empty() {
        println!("No packages matching '{}'", query);
        return Ok(());
    }

    for pack in results {
        let marker = if pack.installed || pack.is_linked() {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:<25} {:<10} {}",
            marker,
            pack.meta.name,
            pack.meta.version,
            truncate(&pack.meta.description, 50)
        );
    }
    Ok(())
}
