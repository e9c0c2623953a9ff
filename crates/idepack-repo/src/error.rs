//! Error types for registry, download and install operations

use idepack_core::CoreError;
use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Resolution Errors ============
    #[error("Pack not found: {name}")]
    PackNotFound { name: String },

    #[error("Pack is not linked: {name}")]
    NotLinked { name: String },

    #[error("Invalid registry {path}: {message}")]
    InvalidRegistry { path: String, message: String },

    // ============ Network Errors ============
    #[error("Network failure fetching {url}: {message}")]
    NetworkFailure { url: String, message: String },

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    // ============ Integrity Errors ============
    #[error("Checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Pack {name} declares no sha256 checksum")]
    MissingChecksum { name: String },

    // ============ Install Errors ============
    #[error("Executable {path} declared by {name} is missing from the package")]
    MissingExecutable { name: String, path: String },

    #[error("{failed} package(s) failed ({succeeded} installed, {skipped} skipped)")]
    PartialBatchFailure {
        succeeded: usize,
        skipped: usize,
        failed: usize,
    },

    // ============ Core Errors ============
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl RepoError {
    /// Remediation text for errors the user can act on
    pub fn hint(&self) -> Option<String> {
        match self {
            RepoError::PackNotFound { name } => Some(format!(
                "run `idepack update` to refresh the package index, or `idepack search {name}`"
            )),
            RepoError::NotLinked { .. } => {
                Some("run `idepack list` to see linked development packs".to_string())
            }
            RepoError::InvalidRegistry { .. } => {
                Some("run `idepack update` to download a fresh registry".to_string())
            }
            RepoError::NetworkFailure { .. } => Some(
                "check your connection and `registry_url` in the idepack config.yaml".to_string(),
            ),
            RepoError::ChecksumMismatch { .. } => Some(
                "the download is corrupt or the index is stale; run `idepack update` and retry"
                    .to_string(),
            ),
            RepoError::MissingChecksum { .. } => Some(
                "the registry entry has no dist.sha256; the publisher can compute it with `idepack pack`"
                    .to_string(),
            ),
            RepoError::Core(CoreError::UnsupportedPlatform { .. }) => {
                Some("this package ships no executable for your platform".to_string())
            }
            RepoError::Core(CoreError::PathTraversal { .. }) => {
                Some("the archive is malformed or malicious; report it to the publisher".to_string())
            }
            RepoError::PartialBatchFailure { .. } => {
                Some("see the individual errors above".to_string())
            }
            _ => None,
        }
    }
}

/// Map a reqwest failure to a network error for `url`
pub(crate) fn network_error(url: &str, e: reqwest::Error) -> RepoError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else if let Some(status) = e.status() {
        format!("HTTP {}", status.as_u16())
    } else {
        e.to_string()
    };
    RepoError::NetworkFailure {
        url: url.to_string(),
        message,
    }
}

/// Parse a URL, keeping the offending text in the error
pub(crate) fn parse_url(url: &str) -> Result<url::Url> {
    url::Url::parse(url).map_err(|e| RepoError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
