//! CLI commands

use idepack_core::{PathLayout, Settings};

use crate::error::Result;

pub mod clean;
pub mod config;
pub mod info;
pub mod init;
pub mod install;
pub mod link;
pub mod list;
pub mod pack;
pub mod search;
pub mod sync;
pub mod uninstall;
pub mod update;

/// Layout and settings, loaded once per invocation
pub struct Context {
    pub layout: PathLayout,
    pub settings: Settings,
}

impl Context {
    pub fn load() -> Result<Self> {
        let layout = PathLayout::from_env()?;
        let settings = Settings::load(&layout)?;
        Ok(Self { layout, settings })
    }
}
