//! Update command - refresh the official registry

use console::style;
use idepack_repo::{HttpClient, RegistryResolver};

use super::Context;
use crate::error::Result;

pub async fn run(ctx: &Context) -> Result<()> {
    let http = HttpClient::new(&ctx.settings)?;
    let mut resolver = RegistryResolver::load(&ctx.layout)?;

    println!(
        "{} {}",
        style("Fetching").cyan().bold(),
        ctx.settings.registry_url
    );
    let count = resolver.update_official(&http, &ctx.settings).await?;
    println!("{} {} package(s) available", style("Updated").green().bold(), count);
    Ok(())
}
