//! Core error types

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid package descriptor {path}: {message}")]
    InvalidDescriptor { path: String, message: String },

    #[error("Invalid package name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Invalid project config: {message}")]
    InvalidProject { message: String },

    #[error("Archive entry escapes the destination directory: {entry}")]
    PathTraversal { entry: String },

    #[error("No executable for platform {current} (supported: {})", supported.join(", "))]
    UnsupportedPlatform {
        current: String,
        supported: Vec<String>,
    },

    #[error("Could not determine the home directory; set IDEPACK_HOME")]
    HomeNotFound,

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Attach the failing action and path to a raw I/O error
pub trait IoContext<T> {
    fn io_context(self, action: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, action: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| CoreError::Io {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

impl CoreError {
    /// True when the error is an I/O `NotFound` (used for optional local state)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
