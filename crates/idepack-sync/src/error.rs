//! Sync error types

use idepack_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid MCP config {path}: {message}")]
    InvalidMcpConfig { path: String, message: String },

    #[error("Rule file {path} of {pack} must be a relative path inside the package")]
    UnsafeRulePath { pack: String, path: String },

    #[error("Packages {first} and {second} both generate rule file {name}")]
    DuplicateRuleFile {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid IDE name '{name}': use letters, digits, '-' or '_'")]
    InvalidIdeName { name: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
