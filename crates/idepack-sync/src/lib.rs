//! Generates IDE configuration from enabled idepack packages
//!
//! - [`IdeAdapter`] / [`Ide`]: where each IDE keeps rules and MCP config
//! - [`McpConfig`]: the MCP JSON model and the managed/user merge
//! - [`SyncEngine`]: clean, render and write for every target IDE
//!
//! Generated artifacts carry the `idepack` marker (rule file prefix and MCP
//! key prefix). Everything else in the IDE directories belongs to the user
//! and is never modified.

pub mod engine;
pub mod error;
pub mod ide;
pub mod mcp;
pub mod rules;

pub use engine::{EnabledPack, IdeSyncReport, SyncEngine, SyncReport};
pub use error::{Result, SyncError};
pub use ide::{Ide, IdeAdapter};
pub use mcp::{MANAGED_PREFIX, McpConfig, McpServer, SELF_KEY, is_managed_key, managed_key};
pub use rules::{RuleFile, render_rules, rule_file_name};
